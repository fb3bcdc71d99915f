//! gpstamp: deterministic photo-stamping engine.
//!
//! Composites a semi-transparent decorative overlay onto a photograph and
//! draws the caption as multi-line, centered, letter-spaced text near the
//! bottom, returning JPEG bytes.
//!
//! ## Architecture
//!
//! - **style**: per-operation styling and compiled-in defaults
//! - **fonts**: font asset resolution with built-in fallback face
//! - **layout**: wrapping, truncation, centering, glyph-run emission
//! - **compose**: overlay resize, opacity scaling, alpha-over compositing
//! - **raster**: glyph rasterization onto the canvas
//! - **output**: alpha flattening and JPEG encoding
//! - **session**: pending photo/caption state for conversational front ends
//! - **error**: error types and handling
//!
//! ## Example
//!
//! ```rust,no_run
//! use gpstamp::{Stamper, StyleConfig};
//! use camino::Utf8Path;
//!
//! let stamper = Stamper::from_paths(
//!     Utf8Path::new("overlay.png"),
//!     Utf8Path::new("fonts/DejaVuSans.ttf"),
//! )?;
//! let photo = std::fs::read("photo.jpg")?;
//! let jpeg = stamper.stamp(&photo, "37.7749° N, 122.4194° W", &StyleConfig::default())?;
//! std::fs::write("stamped.jpg", jpeg)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compose;
pub mod error;
pub mod fallback;
pub mod fonts;
pub mod layout;
pub mod output;
pub mod raster;
pub mod session;
pub mod style;

pub use error::{Error, InputKind, Result};
pub use fonts::{Face, FontLibrary, FontSet};
pub use layout::{GlyphRun, Layout, Line};
pub use output::ImageOutput;
pub use session::{Offer, OrderPolicy, SessionStore};
pub use style::StyleConfig;

use camino::{Utf8Path, Utf8PathBuf};

/// Default capacity for the loaded-font LRU cache.
const FONT_CACHE_SIZE: usize = 8;

/// The stamping engine: owns the process-lifetime assets and runs one
/// synchronous pipeline per call. Holds no per-operation state, so
/// concurrent stamps for different conversations are safe.
pub struct Stamper {
    overlay_bytes: Vec<u8>,
    overlay_name: String,
    font_path: Utf8PathBuf,
    fonts: FontLibrary,
}

impl Stamper {
    /// Create a stamper from in-memory overlay bytes and a font asset path.
    pub fn new(overlay_bytes: Vec<u8>, overlay_name: impl Into<String>, font_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            overlay_bytes,
            overlay_name: overlay_name.into(),
            font_path: font_path.into(),
            fonts: FontLibrary::new(FONT_CACHE_SIZE),
        }
    }

    /// Create a stamper by reading the overlay asset from disk.
    pub fn from_paths(overlay: &Utf8Path, font: &Utf8Path) -> Result<Self> {
        let overlay_bytes = std::fs::read(overlay.as_std_path())?;
        Ok(Self::new(overlay_bytes, overlay.to_string(), font))
    }

    /// Stamp one photo: decode, composite, lay out, rasterize, encode.
    ///
    /// Failures are local to this call; the engine stays valid for
    /// subsequent invocations. There are no retries here.
    pub fn stamp(&self, photo_bytes: &[u8], caption: &str, style: &StyleConfig) -> Result<Vec<u8>> {
        style.validate()?;

        let base = compose::decode_photo(photo_bytes)?;
        let (width, height) = base.dimensions();
        log::debug!("Photo decoded: {}x{}", width, height);

        let overlay = compose::decode_overlay(&self.overlay_bytes, &self.overlay_name)?;
        let mut canvas = compose::composite(&base, &overlay, style.overlay_opacity);
        log::debug!("Overlay composited at opacity {}", style.overlay_opacity);

        let base_size = style.base_font_size(height);
        let first_size = style.first_line_size(height);
        let fonts = self.fonts.resolve(&self.font_path, &[base_size, first_size]);
        if fonts.used_fallback() {
            log::warn!(
                "Rendering caption with the built-in face (sizes {:?} unavailable)",
                fonts.fallback_sizes()
            );
        }

        let laid = layout::layout(caption, width, height, style, &fonts);
        if laid.is_empty() {
            return Err(Error::EmptyCaption);
        }
        log::debug!(
            "Caption laid out: {} lines, block height {:.1}px",
            laid.lines.len(),
            laid.height
        );

        raster::draw_layout(&mut canvas, &laid, &fonts, style.text_color)?;

        ImageOutput::encode_jpeg(&canvas, style.jpeg_quality)
    }
}
