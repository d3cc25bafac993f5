use super::color::yc_to_rgb;
use crate::kaleido::YcFrame;

/// Write ABGR pixel to slice (RGBA8888 little-endian byte order)
#[inline]
fn write_pixel(dest: &mut [u8], r: u8, g: u8, b: u8) {
    dest[0] = 255; // A
    dest[1] = b; // B
    dest[2] = g; // G
    dest[3] = r; // R
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8888 pixel buffer uploaded to the SDL texture each frame
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a new pixel buffer with custom resolution
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; (width * height * 4) as usize],
            width,
            height,
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

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 4) as usize
    }

    /// Read a pixel from the buffer (bounds checked)
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((
                self.pixels[idx + 3], // R
                self.pixels[idx + 2], // G
                self.pixels[idx + 1], // B
            ))
        } else {
            None
        }
    }

    /// Convert a YC frame into this buffer. Only the overlapping area is
    /// written; the rest is cleared to black.
    pub fn copy_from_yc(&mut self, frame: &YcFrame) {
        self.pixels.fill(0);
        let w = self.width.min(frame.width());
        let h = self.height.min(frame.height());
        for y in 0..h {
            let src = &frame.row(y)[..w as usize];
            let start = self.pixel_index(0, y);
            let dest = &mut self.pixels[start..start + w as usize * 4];
            for (out, &p) in dest.chunks_exact_mut(4).zip(src) {
                let (r, g, b) = yc_to_rgb(p);
                write_pixel(out, r, g, b);
            }
        }
    }

    /// Raw bytes for SDL texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kaleido::YcPixel;

    #[test]
    fn test_copy_from_yc() {
        let mut frame = YcFrame::with_stride(4, 3, 8);
        frame.fill(YcPixel::new(4096, 0, 0));
        frame.set(1, 2, YcPixel::BLACK);

        let mut buffer = PixelBuffer::with_size(4, 3);
        buffer.copy_from_yc(&frame);
        assert_eq!(buffer.get_pixel(0, 0), Some((255, 255, 255)));
        assert_eq!(buffer.get_pixel(1, 2), Some((0, 0, 0)));
        // alpha byte is opaque
        assert_eq!(buffer.as_bytes()[0], 255);
    }

    #[test]
    fn test_copy_from_smaller_frame_clears_rest() {
        let mut frame = YcFrame::with_size(2, 2);
        frame.fill(YcPixel::new(4096, 0, 0));
        let mut buffer = PixelBuffer::with_size(4, 4);
        buffer.copy_from_yc(&frame);
        assert_eq!(buffer.get_pixel(1, 1), Some((255, 255, 255)));
        assert_eq!(buffer.get_pixel(3, 3), Some((0, 0, 0)));
    }
}
