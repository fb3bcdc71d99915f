//! Font loading, size resolution, and graceful degradation.
//!
//! This module resolves a font asset plus a set of requested pixel sizes
//! into usable [`Face`] handles. Assets are memory-mapped and parsed once,
//! then LRU-cached; resolution itself happens per stamping operation so
//! failures surface per request. Any load failure substitutes the built-in
//! bitmap face for every requested size and records which sizes degraded.

use crate::error::{Error, Result};
use crate::fallback;
use camino::Utf8Path;
use lru::LruCache;
use memmap2::Mmap;
use read_fonts::{FileRef, FontRef};
use skrifa::instance::{LocationRef, Size};
use skrifa::MetadataProvider;
use std::collections::HashMap;
use std::fs::File;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

static FALLBACK_FACE: Face = Face::Builtin;

/// Loader and cache for memory-mapped font assets.
pub struct FontLibrary {
    cache: Mutex<LruCache<String, Arc<LoadedFont>>>,
}

/// A parsed font backed by its memory-mapped file.
pub struct LoadedFont {
    /// Keeps the mapping alive for the `FontRef` below.
    #[allow(dead_code)]
    mmap: Arc<Mmap>,
    /// Zero-copy view into the mapping.
    font_ref: FontRef<'static>,
}

impl LoadedFont {
    pub fn font_ref(&self) -> &FontRef<'static> {
        &self.font_ref
    }
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont").finish_non_exhaustive()
    }
}

/// A typeface usable at one pixel size.
#[derive(Clone)]
pub enum Face {
    /// An outline font scaled to a specific pixel size.
    Outline { font: Arc<LoadedFont>, size: u32 },
    /// The built-in bitmap face. Fixed metrics, requested size ignored.
    Builtin,
}

impl Face {
    /// Horizontal advance of a single character in pixels.
    pub fn advance(&self, ch: char) -> f32 {
        match self {
            Self::Outline { font, size } => {
                let font_ref = font.font_ref();
                let metrics =
                    font_ref.glyph_metrics(Size::new(*size as f32), LocationRef::default());
                match font_ref.charmap().map(ch) {
                    Some(gid) => metrics.advance_width(gid).unwrap_or(0.0),
                    // .notdef advance keeps unmapped characters visible in
                    // the width math instead of collapsing to zero.
                    None => metrics
                        .advance_width(skrifa::GlyphId::new(0))
                        .unwrap_or(0.0),
                }
            }
            Self::Builtin => fallback::ADVANCE,
        }
    }

    /// Measured pixel width of `text` including inter-character spacing.
    pub fn measure(&self, text: &str, char_spacing: f32) -> f32 {
        let mut width = 0.0;
        let mut chars = 0usize;
        for ch in text.chars() {
            width += self.advance(ch);
            chars += 1;
        }
        if chars > 1 {
            width += char_spacing * (chars - 1) as f32;
        }
        width
    }

    /// Vertical extent of one line of this face in pixels.
    pub fn line_height(&self) -> f32 {
        match self {
            Self::Outline { font, size } => {
                let metrics = font
                    .font_ref()
                    .metrics(Size::new(*size as f32), LocationRef::default());
                metrics.ascent - metrics.descent
            }
            Self::Builtin => fallback::LINE_HEIGHT,
        }
    }

    /// Distance from line top to the baseline in pixels.
    pub fn ascent(&self) -> f32 {
        match self {
            Self::Outline { font, size } => {
                font.font_ref()
                    .metrics(Size::new(*size as f32), LocationRef::default())
                    .ascent
            }
            Self::Builtin => fallback::ASCENT,
        }
    }

    /// Whether this face is the built-in fallback.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

/// Result of resolving one font asset at a set of pixel sizes.
pub struct FontSet {
    faces: HashMap<u32, Face>,
    fallback_sizes: Vec<u32>,
}

impl FontSet {
    /// Face for a resolved size. Unresolved sizes degrade to the built-in
    /// face rather than panic.
    pub fn face(&self, size: u32) -> &Face {
        self.faces.get(&size).unwrap_or(&FALLBACK_FACE)
    }

    /// Sizes that fell back to the built-in face, in request order.
    pub fn fallback_sizes(&self) -> &[u32] {
        &self.fallback_sizes
    }

    /// True if any requested size degraded to the built-in face.
    pub fn used_fallback(&self) -> bool {
        !self.fallback_sizes.is_empty()
    }
}

impl FontLibrary {
    /// Create a library with the given asset-cache capacity.
    pub fn new(cache_size: usize) -> Self {
        let cache_size = NonZeroUsize::new(cache_size)
            .unwrap_or_else(|| NonZeroUsize::new(8).expect("nonzero literal"));
        Self {
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// Resolve a font asset at the requested pixel sizes.
    ///
    /// On any load failure the built-in face is substituted for all
    /// requested sizes for this operation, and a warning is logged.
    pub fn resolve(&self, path: &Utf8Path, sizes: &[u32]) -> FontSet {
        match self.load(path) {
            Ok(font) => FontSet {
                faces: sizes
                    .iter()
                    .map(|&size| {
                        (
                            size,
                            Face::Outline {
                                font: Arc::clone(&font),
                                size,
                            },
                        )
                    })
                    .collect(),
                fallback_sizes: Vec::new(),
            },
            Err(e) => {
                log::warn!("Font load failed: {}. Using built-in face.", e);
                FontSet {
                    faces: sizes.iter().map(|&size| (size, Face::Builtin)).collect(),
                    fallback_sizes: sizes.to_vec(),
                }
            }
        }
    }

    /// Load a font asset, reusing the cached mapping when available.
    pub fn load(&self, path: &Utf8Path) -> Result<Arc<LoadedFont>> {
        let key = path.to_string();

        {
            let mut cache = self
                .cache
                .lock()
                .map_err(|_| Error::Internal("Font cache lock poisoned".to_string()))?;
            if let Some(font) = cache.get(&key) {
                return Ok(Arc::clone(font));
            }
        }

        let font = Arc::new(Self::load_impl(path)?);

        {
            let mut cache = self
                .cache
                .lock()
                .map_err(|_| Error::Internal("Font cache lock poisoned".to_string()))?;
            cache.put(key, Arc::clone(&font));
        }

        Ok(font)
    }

    /// Number of cached assets and cache capacity.
    pub fn cache_stats(&self) -> (usize, usize) {
        match self.cache.lock() {
            Ok(cache) => (cache.len(), cache.cap().get()),
            Err(_) => (0, 0),
        }
    }

    fn load_impl(path: &Utf8Path) -> Result<LoadedFont> {
        let file = File::open(path.as_std_path()).map_err(|e| Error::FontAsset {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| Error::FontAsset {
                path: path.to_string(),
                reason: format!("Failed to memory-map: {}", e),
            })?
        };
        let mmap = Arc::new(mmap);

        // The FontRef borrows the mapping; the Arc above outlives it inside
        // LoadedFont, making the 'static view sound.
        let font_data: &'static [u8] =
            unsafe { std::slice::from_raw_parts(mmap.as_ptr(), mmap.len()) };

        let file_ref = FileRef::new(font_data).map_err(|e| Error::FontAsset {
            path: path.to_string(),
            reason: format!("Failed to parse font file: {}", e),
        })?;

        let font_ref = match file_ref {
            FileRef::Font(f) => f,
            FileRef::Collection(c) => c.get(0).map_err(|e| Error::FontAsset {
                path: path.to_string(),
                reason: format!("Failed to get font from collection: {}", e),
            })?,
        };

        Ok(LoadedFont { mmap, font_ref })
    }
}
