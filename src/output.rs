//! Final image encoding.
//!
//! JPEG has no alpha channel, so the canvas is flattened against opaque
//! black before encoding at the configured quality.

use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage, RgbaImage};

/// Image output format handler.
pub struct ImageOutput;

impl ImageOutput {
    /// Flatten an RGBA canvas to RGB, blending partial alpha against black.
    pub fn flatten(canvas: &RgbaImage) -> RgbImage {
        let (width, height) = canvas.dimensions();
        let mut rgb = RgbImage::new(width, height);
        for (dst, src) in rgb.pixels_mut().zip(canvas.pixels()) {
            let alpha = src.0[3] as u16;
            for c in 0..3 {
                dst.0[c] = ((src.0[c] as u16 * alpha) / 255) as u8;
            }
        }
        rgb
    }

    /// Encode the canvas as JPEG bytes at the given quality.
    pub fn encode_jpeg(canvas: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
        let rgb = Self::flatten(canvas);
        let (width, height) = rgb.dimensions();

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
        encoder
            .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(Error::ImageEncode)?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_flatten_opaque_preserves_color() {
        let canvas = RgbaImage::from_pixel(4, 4, Rgba([200, 100, 50, 255]));
        let rgb = ImageOutput::flatten(&canvas);
        assert_eq!(rgb.get_pixel(0, 0).0, [200, 100, 50]);
    }

    #[test]
    fn test_flatten_blends_against_black() {
        let canvas = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 128]));
        let rgb = ImageOutput::flatten(&canvas);
        // 255 * 128 / 255 = 128.
        assert_eq!(rgb.get_pixel(0, 0).0, [128, 128, 128]);
    }

    #[test]
    fn test_encode_jpeg_signature_and_dimensions() {
        let canvas = RgbaImage::from_pixel(32, 24, Rgba([10, 20, 30, 255]));
        let jpeg = ImageOutput::encode_jpeg(&canvas, 95).unwrap();

        // JPEG SOI marker.
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 24);
    }

    #[test]
    fn test_encode_jpeg_is_rgb() {
        let canvas = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
        let jpeg = ImageOutput::encode_jpeg(&canvas, 95).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        let px = decoded.get_pixel(4, 4).0;
        // Lossy encode, but a solid red stays mostly red.
        assert!(px[0] > 200 && px[1] < 60 && px[2] < 60);
    }
}
