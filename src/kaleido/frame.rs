//! YC frame buffers
//!
//! Frames hold luma/chroma samples the way the editing host hands them over:
//! `y` nominally 0..=4096, `cb`/`cr` nominally -2048..=2048. Rows may be
//! padded, so every index goes through `stride`.

/// One luma/chroma sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YcPixel {
    pub y: i16,
    pub cb: i16,
    pub cr: i16,
}

impl YcPixel {
    /// Background written where the mirrored source runs out
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Outline color for the diagnostic triangle
    pub const HIGHLIGHT: Self = Self::new(2048, 0, 2048);

    #[inline]
    pub const fn new(y: i16, cb: i16, cr: i16) -> Self {
        Self { y, cb, cr }
    }
}

/// A width x height grid of YC samples with a row pitch of `stride`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YcFrame {
    pixels: Vec<YcPixel>,
    width: u32,
    height: u32,
    stride: u32,
}

impl YcFrame {
    /// Tightly packed frame cleared to black
    pub fn with_size(width: u32, height: u32) -> Self {
        Self::with_stride(width, height, width)
    }

    /// Frame whose rows are `stride` samples apart
    ///
    /// # Panics
    /// Panics if `stride < width`
    pub fn with_stride(width: u32, height: u32, stride: u32) -> Self {
        assert!(
            stride >= width,
            "stride ({}) must be at least the width ({})",
            stride,
            width
        );
        Self {
            pixels: vec![YcPixel::BLACK; stride as usize * height as usize],
            width,
            height,
            stride,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Same width, height and stride
    #[inline]
    pub fn same_shape(&self, other: &YcFrame) -> bool {
        self.width == other.width && self.height == other.height && self.stride == other.stride
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride as usize + x as usize
    }

    /// Read a sample (bounds checked)
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<YcPixel> {
        if self.in_bounds(x, y) {
            Some(self.pixels[self.index(x as u32, y as u32)])
        } else {
            None
        }
    }

    /// Write a sample, ignoring coordinates outside the frame
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, pixel: YcPixel) {
        if self.in_bounds(x, y) {
            let idx = self.index(x as u32, y as u32);
            self.pixels[idx] = pixel;
        }
    }

    /// Visible samples of row `y` (padding excluded)
    #[inline]
    pub fn row(&self, y: u32) -> &[YcPixel] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    /// Mutable visible samples of row `y`
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [YcPixel] {
        let start = self.index(0, y);
        let width = self.width as usize;
        &mut self.pixels[start..start + width]
    }

    /// Whole backing store including row padding
    #[inline]
    pub fn samples(&self) -> &[YcPixel] {
        &self.pixels
    }

    /// Fill every visible sample
    pub fn fill(&mut self, pixel: YcPixel) {
        for y in 0..self.height {
            self.row_mut(y).fill(pixel);
        }
    }

    /// Copy visible samples from a frame of the same width and height
    ///
    /// # Panics
    /// Panics if the dimensions differ
    pub fn copy_from(&mut self, src: &YcFrame) {
        assert!(
            self.width == src.width && self.height == src.height,
            "copy_from: {}x{} into {}x{}",
            src.width,
            src.height,
            self.width,
            self.height
        );
        for y in 0..self.height {
            self.row_mut(y).copy_from_slice(src.row(y));
        }
    }
}

/// Edit/temp frame pair. The filter reads `edit` and writes `temp`, then the
/// roles are exchanged so the result becomes the next `edit`.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    frames: [YcFrame; 2],
    edit: usize,
}

impl DoubleBuffer {
    /// Start with `frame` as the edit buffer and a same-shaped temp buffer
    pub fn new(frame: YcFrame) -> Self {
        let temp = YcFrame::with_stride(frame.width, frame.height, frame.stride);
        Self {
            frames: [frame, temp],
            edit: 0,
        }
    }

    #[inline]
    pub fn edit(&self) -> &YcFrame {
        &self.frames[self.edit]
    }

    #[inline]
    pub fn edit_mut(&mut self) -> &mut YcFrame {
        &mut self.frames[self.edit]
    }

    #[inline]
    pub fn temp(&self) -> &YcFrame {
        &self.frames[1 - self.edit]
    }

    /// Borrow the edit frame for reading and the temp frame for writing.
    /// The two never alias.
    pub fn split_mut(&mut self) -> (&YcFrame, &mut YcFrame) {
        let (first, second) = self.frames.split_at_mut(1);
        if self.edit == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Exchange roles; no samples are copied
    #[inline]
    pub fn swap(&mut self) {
        self.edit = 1 - self.edit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_padding_is_not_visible() {
        let mut frame = YcFrame::with_stride(3, 2, 8);
        frame.fill(YcPixel::HIGHLIGHT);
        assert_eq!(frame.samples().len(), 16);
        assert_eq!(frame.row(1), &[YcPixel::HIGHLIGHT; 3]);
        // padding after the first row stays untouched
        assert_eq!(frame.samples()[3], YcPixel::BLACK);
    }

    #[test]
    fn test_get_set_bounds() {
        let mut frame = YcFrame::with_size(4, 4);
        frame.set(-1, 0, YcPixel::HIGHLIGHT);
        frame.set(4, 0, YcPixel::HIGHLIGHT);
        frame.set(2, 3, YcPixel::new(100, -5, 5));
        assert_eq!(frame.get(2, 3), Some(YcPixel::new(100, -5, 5)));
        assert_eq!(frame.get(4, 0), None);
        assert!(frame.samples().iter().filter(|p| **p == YcPixel::HIGHLIGHT).count() == 0);
    }

    #[test]
    fn test_swap_exchanges_roles_without_copy() {
        let mut first = YcFrame::with_size(2, 2);
        first.fill(YcPixel::new(10, 0, 0));
        let mut buffers = DoubleBuffer::new(first);

        {
            let (edit, temp) = buffers.split_mut();
            assert_eq!(edit.get(0, 0), Some(YcPixel::new(10, 0, 0)));
            temp.fill(YcPixel::new(20, 0, 0));
        }
        buffers.swap();
        assert_eq!(buffers.edit().get(1, 1), Some(YcPixel::new(20, 0, 0)));
        assert_eq!(buffers.temp().get(1, 1), Some(YcPixel::new(10, 0, 0)));

        // second round writes into the original frame
        {
            let (_, temp) = buffers.split_mut();
            temp.fill(YcPixel::new(30, 0, 0));
        }
        buffers.swap();
        assert_eq!(buffers.edit().get(0, 1), Some(YcPixel::new(30, 0, 0)));
    }

    #[test]
    fn test_copy_from_respects_strides() {
        let mut src = YcFrame::with_size(3, 2);
        src.set(2, 1, YcPixel::new(7, 8, 9));
        let mut dst = YcFrame::with_stride(3, 2, 5);
        dst.copy_from(&src);
        assert_eq!(dst.get(2, 1), Some(YcPixel::new(7, 8, 9)));
    }

    #[test]
    #[should_panic]
    fn test_stride_smaller_than_width_panics() {
        let _ = YcFrame::with_stride(10, 2, 4);
    }
}
