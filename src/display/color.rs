//! RGB <-> YC conversion for the host side
//!
//! BT.601 in integer math. YC uses the editing host's ranges: luma 0..=4096
//! for black..white, chroma -2048..=2048.

use crate::kaleido::YcPixel;

#[inline]
fn div_round(v: i64, d: i64) -> i64 {
    if v >= 0 {
        (v + d / 2) / d
    } else {
        (v - d / 2) / d
    }
}

/// 8-bit RGB to YC
#[inline]
pub fn rgb_to_yc(r: u8, g: u8, b: u8) -> YcPixel {
    let (r, g, b) = (i64::from(r), i64::from(g), i64::from(b));
    // coefficients scaled so that 255 maps to 4096
    let y = div_round(1225 * r + 2404 * g + 467 * b, 255);
    let cb = div_round(-691 * r - 1357 * g + 2048 * b, 255);
    let cr = div_round(2048 * r - 1715 * g - 333 * b, 255);
    YcPixel::new(y as i16, cb as i16, cr as i16)
}

/// YC to 8-bit RGB, clamped
#[inline]
pub fn yc_to_rgb(p: YcPixel) -> (u8, u8, u8) {
    let (y, cb, cr) = (i64::from(p.y), i64::from(p.cb), i64::from(p.cr));
    let y = y << 10;
    // 10-bit fractional coefficients, then 4096 -> 255
    let to_u8 = |v: i64| -> u8 { div_round(v * 255, 1 << 22).clamp(0, 255) as u8 };
    (
        to_u8(y + 1436 * cr),
        to_u8(y - 352 * cb - 731 * cr),
        to_u8(y + 1815 * cb),
    )
}
