//! Frame Resampler
//!
//! Full-frame scan: every destination pixel asks the lattice where it mirrors
//! from, then blends the 2x2 source neighbourhood at that position.

use super::fixed::{self, FIX_MASK, FIX_ONE, FIX_SHIFT};
use super::frame::{YcFrame, YcPixel};
use super::lattice::TriangularLattice;

/// Bilinear weights for one sample position, fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWeights {
    pub x: i32,
    pub x_inv: i32,
    pub y: i32,
    pub y_inv: i32,
}

impl SampleWeights {
    /// Weights from the fractional offsets (0..FIX_ONE) inside a pixel
    #[inline]
    pub fn new(fx: i32, fy: i32) -> Self {
        Self {
            x: fx,
            x_inv: FIX_ONE - fx,
            y: fy,
            y_inv: FIX_ONE - fy,
        }
    }

    /// Corner weights (top-left, top-right, bottom-left, bottom-right).
    /// Only `x*y` is rounded; the rest are derived from it so the four
    /// always sum to exactly `FIX_ONE`.
    #[inline]
    pub fn corners(&self) -> [i32; 4] {
        let br = fixed::mul_round(self.x, self.y);
        let tr = self.x - br;
        let bl = self.y - br;
        let tl = self.x_inv - bl;
        [tl, tr, bl, br]
    }

    /// Blend four neighbouring samples channel by channel
    #[inline]
    pub fn blend(&self, tl: YcPixel, tr: YcPixel, bl: YcPixel, br: YcPixel) -> YcPixel {
        let [wtl, wtr, wbl, wbr] = self.corners();
        // sample * weight fits in 28 bits, the sum of four in 30
        let mix = |a: i16, b: i16, c: i16, d: i16| -> i16 {
            let sum = i32::from(a) * wtl
                + i32::from(b) * wtr
                + i32::from(c) * wbl
                + i32::from(d) * wbr;
            ((sum + (FIX_ONE >> 1)) >> FIX_SHIFT) as i16
        };
        YcPixel {
            y: mix(tl.y, tr.y, bl.y, br.y),
            cb: mix(tl.cb, tr.cb, bl.cb, br.cb),
            cr: mix(tl.cr, tr.cr, bl.cr, br.cr),
        }
    }
}

/// Sample `src` at a fixed-point position. Positions whose 2x2 footprint is
/// not fully inside the frame give `YcPixel::BLACK`.
#[inline]
pub fn sample_bilinear(src: &YcFrame, sx: i64, sy: i64) -> YcPixel {
    let ix = sx >> FIX_SHIFT;
    let iy = sy >> FIX_SHIFT;
    let max_x = i64::from(src.width()) - 1;
    let max_y = i64::from(src.height()) - 1;

    if ix < 0 || ix + 1 > max_x || iy < 0 || iy + 1 > max_y {
        return YcPixel::BLACK;
    }

    let mask = i64::from(FIX_MASK);
    let weights = SampleWeights::new((sx & mask) as i32, (sy & mask) as i32);

    let stride = src.stride() as usize;
    let idx = iy as usize * stride + ix as usize;
    let samples = src.samples();
    weights.blend(
        samples[idx],
        samples[idx + 1],
        samples[idx + stride],
        samples[idx + stride + 1],
    )
}

/// Populate every pixel of `dst` from `src` through the lattice.
///
/// # Panics
/// Panics if the frames differ in width or height.
pub fn render_frame(src: &YcFrame, dst: &mut YcFrame, lattice: &TriangularLattice) {
    assert!(
        src.width() == dst.width() && src.height() == dst.height(),
        "render_frame: source is {}x{} but destination is {}x{}",
        src.width(),
        src.height(),
        dst.width(),
        dst.height()
    );

    for h in 0..dst.height() {
        let row = dst.row_mut(h);
        for (w, out) in row.iter_mut().enumerate() {
            let (sx, sy) = lattice.map(w as i32, h as i32);
            *out = sample_bilinear(src, sx, sy);
        }
    }
}
