//! Source textures
//!
//! RGBA images the host feeds into the filter: decoded from disk or
//! generated procedurally, then converted once into a YC frame.

use crate::display::rgb_to_yc;
use crate::kaleido::YcFrame;
use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use std::path::Path;
use std::str::FromStr;

/// A texture stored as RGBA pixels
#[derive(Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>, // RGBA format, 4 bytes per pixel
}

impl Texture {
    /// Create a new empty texture
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Decode an image file and resize it to exactly `width` x `height`
    pub fn load(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        let rgba = img.resize_exact(width, height, FilterType::Triangle).to_rgba8();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set a pixel in the texture
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) {
        if x < self.width && y < self.height {
            let idx = ((y * self.width + x) * 4) as usize;
            self.pixels[idx] = r;
            self.pixels[idx + 1] = g;
            self.pixels[idx + 2] = b;
            self.pixels[idx + 3] = 255;
        }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let idx = ((y * self.width + x) * 4) as usize;
        (self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }

    /// Convert to a YC frame with the given row stride
    pub fn to_yc_frame(&self, stride: u32) -> YcFrame {
        let mut frame = YcFrame::with_stride(self.width, self.height, stride);
        for y in 0..self.height {
            for (x, out) in frame.row_mut(y).iter_mut().enumerate() {
                let (r, g, b) = self.pixel(x as u32, y);
                *out = rgb_to_yc(r, g, b);
            }
        }
        frame
    }
}

// ============================================================================
// Procedural Texture Generators
// ============================================================================

/// Built-in source images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Checker,
    Xor,
    Plasma,
}

impl FromStr for Pattern {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "checker" | "checkerboard" => Ok(Self::Checker),
            "xor" => Ok(Self::Xor),
            "plasma" => Ok(Self::Plasma),
            other => bail!("unknown pattern '{}' (expected checker, xor or plasma)", other),
        }
    }
}

impl Texture {
    pub fn pattern(pattern: Pattern, width: u32, height: u32) -> Self {
        match pattern {
            Pattern::Checker => Self::checkerboard(width, height, 32, (255, 100, 50), (50, 100, 255)),
            Pattern::Xor => Self::xor_pattern(width, height),
            Pattern::Plasma => Self::plasma(width, height),
        }
    }

    /// Generate a checkerboard pattern
    pub fn checkerboard(
        width: u32,
        height: u32,
        tile_size: u32,
        c1: (u8, u8, u8),
        c2: (u8, u8, u8),
    ) -> Self {
        let mut tex = Self::new(width, height);
        let tile_size = tile_size.max(1);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / tile_size) + (y / tile_size)) % 2 == 0;
                let (r, g, b) = if checker { c1 } else { c2 };
                tex.set_pixel(x, y, r, g, b);
            }
        }
        tex
    }

    /// Generate an XOR pattern, tinted per channel so mirror seams show up
    pub fn xor_pattern(width: u32, height: u32) -> Self {
        let mut tex = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = (x ^ y) as u8;
                tex.set_pixel(x, y, v, v.wrapping_mul(3), 255 - v);
            }
        }
        tex
    }

    /// Generate a plasma texture using sine waves
    pub fn plasma(width: u32, height: u32) -> Self {
        let tau = std::f32::consts::TAU;
        let palette: Vec<(u8, u8, u8)> = (0..256)
            .map(|i| {
                let t = i as f32 / 255.0;
                let r = ((t * tau * 2.0).sin() * 0.5 + 0.5) * 255.0;
                let g = ((t * tau * 3.0 + 1.0).sin() * 0.5 + 0.5) * 255.0;
                let b = ((t * tau * 5.0 + 2.0).sin() * 0.5 + 0.5) * 255.0;
                (r as u8, g as u8, b as u8)
            })
            .collect();

        let mut tex = Self::new(width, height);
        let scale = tau / width.max(height).max(1) as f32;

        for y in 0..height {
            for x in 0..width {
                let fx = x as f32 * scale;
                let fy = y as f32 * scale;

                // Sum of sines
                let v1 = (fx * 2.0).sin();
                let v2 = (fy * 3.0).sin();
                let v3 = ((fx + fy) * 1.5).sin();
                let v4 = ((fx * fx + fy * fy).sqrt() * 2.0).sin();

                let sum = (v1 + v2 + v3 + v4 + 4.0) / 8.0; // Normalize to 0-1
                let idx = (sum * (palette.len() - 1) as f32) as usize;
                let (r, g, b) = palette[idx.min(palette.len() - 1)];

                tex.set_pixel(x, y, r, g, b);
            }
        }
        tex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kaleido::YcPixel;

    #[test]
    fn test_pattern_names() {
        assert_eq!("checker".parse::<Pattern>().unwrap(), Pattern::Checker);
        assert_eq!("XOR".parse::<Pattern>().unwrap(), Pattern::Xor);
        assert!("stripes".parse::<Pattern>().is_err());
    }

    #[test]
    fn test_checkerboard_tiles() {
        let tex = Texture::checkerboard(64, 32, 16, (255, 255, 255), (0, 0, 0));
        assert_eq!(tex.pixel(0, 0), (255, 255, 255));
        assert_eq!(tex.pixel(16, 0), (0, 0, 0));
        assert_eq!(tex.pixel(16, 16), (255, 255, 255));
    }

    #[test]
    fn test_yc_frame_conversion() {
        let tex = Texture::checkerboard(8, 4, 4, (255, 255, 255), (0, 0, 0));
        let frame = tex.to_yc_frame(16);
        assert_eq!(frame.stride(), 16);
        assert_eq!(frame.get(0, 0), Some(YcPixel::new(4096, 0, 0)));
        assert_eq!(frame.get(4, 0), Some(YcPixel::BLACK));
    }

    #[test]
    fn test_load_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src.png");
        image::RgbImage::from_pixel(10, 6, image::Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();
        let tex = Texture::load(&path, 20, 12).unwrap();
        assert_eq!((tex.width(), tex.height()), (20, 12));
        assert_eq!(tex.pixel(19, 11), (200, 10, 10));
    }
}
