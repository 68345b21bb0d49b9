//! Image decoding into GPU-ready pixel buffers.

use std::io::Cursor;

use image::ImageReader;

use crate::error::AssetError;

/// How decoded pixels will be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    /// 8-bit color texture, uploaded as sRGB.
    Color,
    /// High dynamic range image (HDR/EXR), kept as linear `f32`.
    Hdr,
}

/// Decoded pixel storage, always four channels.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    /// RGBA, 8 bits per channel.
    Rgba8(Vec<u8>),
    /// RGBA, `f32` per channel.
    Rgba32F(Vec<f32>),
}

/// A decoded image.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data, row-major, top row first.
    pub pixels: PixelData,
}

impl DecodedImage {
    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Decode `bytes` (format sniffed from content) into the layout `kind` asks for.
pub fn decode_image(bytes: &[u8], kind: ImageKind, name: &str) -> Result<DecodedImage, AssetError> {
    let decode_err = |source| AssetError::Decode {
        name: name.to_string(),
        source,
    };
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?;
    let image = reader.decode().map_err(decode_err)?;

    let (width, height) = (image.width(), image.height());
    let pixels = match kind {
        ImageKind::Color => PixelData::Rgba8(image.to_rgba8().into_raw()),
        ImageKind::Hdr => PixelData::Rgba32F(image.to_rgba32f().into_raw()),
    };
    tracing::debug!(name, width, height, ?kind, "decoded image");
    Ok(DecodedImage {
        width,
        height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png_as_color() {
        let bytes = png_bytes(3, 2, [10, 20, 30, 255]);
        let img = decode_image(&bytes, ImageKind::Color, "test.png").unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        match &img.pixels {
            PixelData::Rgba8(data) => {
                assert_eq!(data.len(), 3 * 2 * 4);
                assert_eq!(&data[..4], &[10, 20, 30, 255]);
            }
            other => panic!("expected Rgba8, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_png_as_hdr_is_normalized_float() {
        let bytes = png_bytes(1, 1, [255, 0, 51, 255]);
        let img = decode_image(&bytes, ImageKind::Hdr, "test.png").unwrap();
        match &img.pixels {
            PixelData::Rgba32F(data) => {
                assert!((data[0] - 1.0).abs() < 1e-6);
                assert!(data[1].abs() < 1e-6);
                assert!((data[2] - 0.2).abs() < 1e-3);
            }
            other => panic!("expected Rgba32F, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = decode_image(b"definitely not an image", ImageKind::Color, "junk").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
        assert!(err.to_string().contains("junk"));
    }
}
