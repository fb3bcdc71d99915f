//! Overlay compositing.
//!
//! Decodes the decorative overlay, resizes it to exactly the photo's
//! dimensions, scales its alpha channel by the configured opacity, and
//! alpha-over composites it onto a fresh canvas. Inputs are never mutated.

use crate::error::{Error, Result};
use image::imageops::FilterType;
use image::{imageops, RgbaImage};

/// Decode base photo bytes into an RGBA buffer.
pub fn decode_photo(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes).map_err(|e| Error::PhotoDecode {
        reason: e.to_string(),
    })?;
    Ok(image.to_rgba8())
}

/// Decode overlay asset bytes into an RGBA buffer.
///
/// A failure here is fatal to the operation, unlike font degradation.
pub fn decode_overlay(bytes: &[u8], name: &str) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes).map_err(|e| Error::OverlayAsset {
        path: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(image.to_rgba8())
}

/// Composite `overlay` over `base` at the given opacity, producing a new
/// canvas with the base photo's exact dimensions.
pub fn composite(base: &RgbaImage, overlay: &RgbaImage, opacity: f32) -> RgbaImage {
    let (width, height) = base.dimensions();

    let resized;
    let overlay = if overlay.dimensions() == (width, height) {
        overlay
    } else {
        resized = imageops::resize(overlay, width, height, FilterType::Lanczos3);
        &resized
    };

    let mut canvas = base.clone();
    for (dst, src) in canvas.pixels_mut().zip(overlay.pixels()) {
        // Uniform opacity scale on the overlay's own alpha, color untouched.
        let alpha = (src.0[3] as f32 * opacity).round().clamp(0.0, 255.0);
        let sa = alpha / 255.0;
        if sa <= 0.0 {
            continue;
        }
        let da = dst.0[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);

        for c in 0..3 {
            let sc = src.0[c] as f32;
            let dc = dst.0[c] as f32;
            // Source-over on straight-alpha channels.
            let out = if out_a > 0.0 {
                (sc * sa + dc * da * (1.0 - sa)) / out_a
            } else {
                0.0
            };
            dst.0[c] = out.round().clamp(0.0, 255.0) as u8;
        }
        dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(pixel))
    }

    #[test]
    fn test_canvas_matches_photo_dimensions() {
        let base = solid(64, 48, [10, 20, 30, 255]);
        let overlay = solid(10, 100, [0, 0, 0, 128]);
        let canvas = composite(&base, &overlay, 0.89);
        assert_eq!(canvas.dimensions(), (64, 48));
    }

    #[test]
    fn test_zero_opacity_leaves_base_untouched() {
        let base = solid(8, 8, [10, 20, 30, 255]);
        let overlay = solid(8, 8, [200, 200, 200, 255]);
        let canvas = composite(&base, &overlay, 0.0);
        assert_eq!(canvas, base);
    }

    #[test]
    fn test_opaque_overlay_fully_covers() {
        let base = solid(8, 8, [10, 20, 30, 255]);
        let overlay = solid(8, 8, [200, 100, 50, 255]);
        let canvas = composite(&base, &overlay, 1.0);
        assert_eq!(canvas.get_pixel(4, 4).0, [200, 100, 50, 255]);
    }

    #[test]
    fn test_partial_opacity_blends() {
        let base = solid(4, 4, [0, 0, 0, 255]);
        let overlay = solid(4, 4, [255, 255, 255, 255]);
        let canvas = composite(&base, &overlay, 0.5);

        // alpha 255 * 0.5 rounds to 128; 255 * 128/255 = 128.
        let px = canvas.get_pixel(0, 0).0;
        assert_eq!(px[0], 128);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_base_is_not_mutated() {
        let base = solid(8, 8, [10, 20, 30, 255]);
        let snapshot = base.clone();
        let overlay = solid(8, 8, [255, 255, 255, 255]);
        let _ = composite(&base, &overlay, 1.0);
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_decode_photo_rejects_garbage() {
        let err = decode_photo(b"not an image").unwrap_err();
        assert!(err.to_string().contains("Could not decode the photo"));
    }

    #[test]
    fn test_decode_overlay_rejects_garbage() {
        let err = decode_overlay(b"not an image", "overlay.png").unwrap_err();
        assert!(err.to_string().contains("overlay.png"));
    }

    #[test]
    fn test_decode_round_trip() {
        let base = solid(16, 12, [1, 2, 3, 255]);
        let mut bytes = Vec::new();
        base.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        let decoded = decode_photo(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 12));
        assert_eq!(decoded.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }
}
