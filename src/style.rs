//! Style configuration for stamping operations.
//!
//! A [`StyleConfig`] is supplied once per stamping operation and never
//! mutated. The compiled-in defaults reproduce the historical stamping
//! constants; callers needing a different variant supply their own values,
//! typically from a JSON file.

use crate::error::{Error, Result};
use serde::Deserialize;

/// Soft character budget for greedy word wrapping, applied before the
/// pixel-width correction pass. Fixed, not proportional to canvas width.
pub const WRAP_CHAR_BUDGET: usize = 60;

/// Canvas-height fraction that drives the base font size.
const BASE_SIZE_FRACTION: f64 = 0.018;

/// Smallest base font size we will ever lay out with.
const MIN_FONT_SIZE: u32 = 10;

/// Immutable per-operation styling for caption rendering and compositing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Caption color as RGB.
    pub text_color: [u8; 3],
    /// Lines are wrapped/truncated to this fraction of the canvas width.
    pub max_width_frac: f32,
    /// Vertical anchor for the text block, as a fraction of canvas height.
    pub anchor_frac: f32,
    /// Horizontal nudge applied to the whole text block, in pixels.
    pub offset_x: i32,
    /// Vertical nudge applied to the whole text block, in pixels.
    pub offset_y: i32,
    /// Extra pixels added to the first line's font size.
    pub first_line_boost: u32,
    /// Extra pixels inserted between characters.
    pub char_spacing: f32,
    /// Extra pixels inserted between lines.
    pub line_gap: f32,
    /// Overlay opacity in [0, 1].
    pub overlay_opacity: f32,
    /// JPEG encode quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            text_color: [255, 255, 255],
            max_width_frac: 0.90,
            anchor_frac: 0.88,
            offset_x: -30,
            offset_y: -40,
            first_line_boost: 6,
            char_spacing: 0.8,
            line_gap: 8.0,
            overlay_opacity: 0.89,
            jpeg_quality: 95,
        }
    }
}

impl StyleConfig {
    /// Validate style parameters before a stamping operation.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            return Err(Error::InvalidStyle {
                reason: format!(
                    "Overlay opacity {} out of bounds (0.0-1.0)",
                    self.overlay_opacity
                ),
            });
        }

        if !(self.max_width_frac > 0.0 && self.max_width_frac <= 1.0) {
            return Err(Error::InvalidStyle {
                reason: format!(
                    "Max width fraction {} out of bounds (0.0-1.0]",
                    self.max_width_frac
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.anchor_frac) {
            return Err(Error::InvalidStyle {
                reason: format!("Anchor fraction {} out of bounds (0.0-1.0)", self.anchor_frac),
            });
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(Error::InvalidStyle {
                reason: format!("JPEG quality {} out of bounds (1-100)", self.jpeg_quality),
            });
        }

        if self.char_spacing < 0.0 || self.line_gap < 0.0 {
            return Err(Error::InvalidStyle {
                reason: "Character and line spacing must be non-negative".to_string(),
            });
        }

        Ok(())
    }

    /// Base font size for a canvas of the given height: proportional to the
    /// canvas with a fixed floor.
    pub fn base_font_size(&self, canvas_height: u32) -> u32 {
        let proportional = (canvas_height as f64 * BASE_SIZE_FRACTION) as i64 - 2;
        (proportional.max(MIN_FONT_SIZE as i64)) as u32
    }

    /// Font size for the first rendered line (emphasized).
    pub fn first_line_size(&self, canvas_height: u32) -> u32 {
        self.base_font_size(canvas_height) + self.first_line_boost
    }
}
