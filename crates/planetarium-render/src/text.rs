//! Bitmap text rasterization for screen-space labels.
//!
//! Glyphs come from the 8x8 `font8x8` basic set and are scaled by an integer
//! factor so they stay crisp under nearest sampling.

use font8x8::legacy::BASIC_LEGACY;

/// Glyph cell edge in font pixels.
pub const GLYPH_SIZE: u32 = 8;

/// An RGBA8 image ready for [`crate::TextureManager`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Rasterizes text at a fixed integer scale.
#[derive(Clone, Copy, Debug)]
pub struct TextRaster {
    scale: u32,
}

impl TextRaster {
    /// Scale 0 is treated as 1.
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Pixel size of `text`. Lines are split on `\n`; never smaller than 1x1.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        let columns = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
        let rows = text.lines().count().max(1) as u32;
        let cell = GLYPH_SIZE * self.scale;
        ((columns * cell).max(1), rows * cell)
    }

    /// Draw `text` in `color` on a transparent background.
    pub fn rasterize(&self, text: &str, color: [u8; 4]) -> RasterImage {
        let (width, height) = self.measure(text);
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        let cell = GLYPH_SIZE * self.scale;

        for (row, line) in text.lines().enumerate() {
            for (column, ch) in line.chars().enumerate() {
                let glyph = glyph_for(ch);
                let origin_x = column as u32 * cell;
                let origin_y = row as u32 * cell;

                for (gy, bits) in glyph.iter().enumerate() {
                    for gx in 0..GLYPH_SIZE {
                        if bits & (1 << gx) == 0 {
                            continue;
                        }
                        for sy in 0..self.scale {
                            let y = origin_y + gy as u32 * self.scale + sy;
                            let start = (y * width + origin_x + gx * self.scale) as usize * 4;
                            for texel in pixels[start..start + self.scale as usize * 4].chunks_exact_mut(4) {
                                texel.copy_from_slice(&color);
                            }
                        }
                    }
                }
            }
        }

        RasterImage {
            width,
            height,
            pixels,
        }
    }
}

fn glyph_for(ch: char) -> [u8; 8] {
    let index = if ch.is_ascii() { ch as usize } else { '?' as usize };
    BASIC_LEGACY[index]
}
