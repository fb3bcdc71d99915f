//! Error types for gpstamp.
//!
//! Every failure carries a human-readable message suitable for direct
//! display to the end user; no variant requires the caller to dig for
//! context.

use std::fmt;
use thiserror::Error;

/// Which half of a (photo, caption) pair a session is still waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Photo,
    Caption,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo => write!(f, "photo"),
            Self::Caption => write!(f, "caption text"),
        }
    }
}

/// Main error type for gpstamp operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Base photo bytes could not be decoded as an image
    #[error("Could not decode the photo: {reason}")]
    PhotoDecode { reason: String },

    /// Overlay asset missing or corrupt; fatal to the operation
    #[error("Could not decode the overlay asset {path}: {reason}")]
    OverlayAsset { path: String, reason: String },

    /// Font asset could not be loaded. Callers degrade to the built-in
    /// face instead of surfacing this to the user.
    #[error("Could not load font {path}: {reason}")]
    FontAsset { path: String, reason: String },

    /// Caption text contains no non-blank line
    #[error("The caption is empty - send some text to stamp onto the photo")]
    EmptyCaption,

    /// One half of the (photo, caption) pair is still missing
    #[error("Still waiting for the {missing} - send it to finish this stamp")]
    InputMissing { missing: InputKind },

    /// Style configuration failed validation
    #[error("Invalid style configuration: {reason}")]
    InvalidStyle { reason: String },

    /// Image encoding error
    #[error("Image encoding error: {0}")]
    ImageEncode(#[source] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specialized Result type for gpstamp operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_photo_decode() {
        let err = Error::PhotoDecode {
            reason: "not a raster format".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Could not decode the photo"));
        assert!(msg.contains("not a raster format"));
    }

    #[test]
    fn test_error_display_input_missing() {
        let err = Error::InputMissing {
            missing: InputKind::Caption,
        };
        assert!(err.to_string().contains("caption text"));

        let err = Error::InputMissing {
            missing: InputKind::Photo,
        };
        assert!(err.to_string().contains("photo"));
    }

    #[test]
    fn test_error_display_overlay_asset() {
        let err = Error::OverlayAsset {
            path: "overlay.png".to_string(),
            reason: "truncated file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("overlay.png"));
        assert!(msg.contains("truncated file"));
    }
}
