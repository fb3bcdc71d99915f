//! Caption layout: wrapping, truncation, centering, and glyph-run emission.
//!
//! The layout engine turns raw multi-line caption text into positioned
//! glyph runs. Letter spacing is character-level: every line is emitted as
//! one run per character, with the cursor advancing by the character's
//! measured width plus the configured spacing. The first rendered line uses
//! the boosted font size; later lines use the base size.

use crate::fonts::FontSet;
use crate::style::{StyleConfig, WRAP_CHAR_BUDGET};

/// One positioned, styled character ready for rasterization.
#[derive(Debug, Clone)]
pub struct GlyphRun {
    pub ch: char,
    /// Left edge in canvas pixels.
    pub x: f32,
    /// Line top in canvas pixels.
    pub y: f32,
    /// Font size key into the operation's [`FontSet`].
    pub size: u32,
}

/// One laid-out line: ordered glyph runs sharing a font size and top y.
/// Blank input lines survive as lines with zero runs.
#[derive(Debug, Clone)]
pub struct Line {
    pub runs: Vec<GlyphRun>,
    /// Measured pixel width including inter-character spacing.
    pub width: f32,
    pub font_size: u32,
    pub y: f32,
}

/// Complete layout for one caption; consumed exactly once by the rasterizer.
#[derive(Debug, Clone)]
pub struct Layout {
    pub lines: Vec<Line>,
    /// Uniform vertical advance between consecutive line tops.
    pub advance: f32,
    /// Total block height in pixels.
    pub height: f32,
}

impl Layout {
    /// A caption with no non-blank line produces an empty layout; the
    /// orchestrator turns this into a user-facing error.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Lay out caption text against a canvas of the given dimensions.
pub fn layout(
    text: &str,
    canvas_width: u32,
    canvas_height: u32,
    style: &StyleConfig,
    fonts: &FontSet,
) -> Layout {
    let base_size = style.base_font_size(canvas_height);
    let first_size = style.first_line_size(canvas_height);
    let base_face = fonts.face(base_size);

    // One advance for every line, computed from the base face: the boosted
    // first line shares it so blank lines step the cursor identically.
    let advance = base_face.line_height() + style.line_gap;

    let wrapped = wrap_caption(text);
    if !wrapped.iter().any(|line| !line.is_empty()) {
        return Layout {
            lines: Vec::new(),
            advance,
            height: 0.0,
        };
    }

    let max_px = style.max_width_frac * canvas_width as f32;
    let start_y = style.anchor_frac * canvas_height as f32 + style.offset_y as f32;

    let mut lines = Vec::with_capacity(wrapped.len());
    for (idx, segment) in wrapped.into_iter().enumerate() {
        let size = if idx == 0 { first_size } else { base_size };
        let face = fonts.face(size);

        // Hard pixel bound: drop trailing characters until the line fits,
        // but never below a single character.
        let mut segment = segment;
        while face.measure(&segment, style.char_spacing) > max_px && segment.chars().count() > 1 {
            segment.pop();
        }

        let width = face.measure(&segment, style.char_spacing);
        let y = start_y + idx as f32 * advance;
        // Each line is centered independently, then nudged by the block
        // offset.
        let start_x = (canvas_width as f32 - width) / 2.0 + style.offset_x as f32;

        let mut runs = Vec::with_capacity(segment.chars().count());
        let mut cursor_x = start_x;
        for ch in segment.chars() {
            runs.push(GlyphRun {
                ch,
                x: cursor_x,
                y,
                size,
            });
            cursor_x += face.advance(ch) + style.char_spacing;
        }

        lines.push(Line {
            runs,
            width,
            font_size: size,
            y,
        });
    }

    let height = lines.len() as f32 * advance;
    Layout {
        lines,
        advance,
        height,
    }
}

/// Split raw caption text into wrapped segments, preserving blank input
/// lines as empty strings.
fn wrap_caption(text: &str) -> Vec<String> {
    let mut wrapped = Vec::new();
    for raw in text.lines() {
        if raw.trim().is_empty() {
            wrapped.push(String::new());
            continue;
        }
        wrapped.extend(wrap_budget(raw, WRAP_CHAR_BUDGET));
    }
    wrapped
}

/// Greedy word wrap at a soft character budget. Words longer than the
/// budget are hard-broken at the budget.
fn wrap_budget(line: &str, budget: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > budget {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(budget) {
                if chunk.len() == budget {
                    segments.push(chunk.iter().collect());
                } else {
                    current = chunk.iter().collect();
                    current_len = chunk.len();
                }
            }
            continue;
        }

        if current.is_empty() {
            current = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= budget {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            segments.push(std::mem::take(&mut current));
            current = word.to_string();
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontLibrary;
    use approx::assert_relative_eq;
    use camino::Utf8Path;

    // All layout tests run against the built-in face: deterministic 6 px
    // advances, 9 px line height.
    fn builtin_fonts(style: &StyleConfig, canvas_height: u32) -> FontSet {
        let library = FontLibrary::new(2);
        library.resolve(
            Utf8Path::new("/no/such/font.ttf"),
            &[
                style.base_font_size(canvas_height),
                style.first_line_size(canvas_height),
            ],
        )
    }

    fn line_text(line: &Line) -> String {
        line.runs.iter().map(|r| r.ch).collect()
    }

    #[test]
    fn test_blank_lines_preserved_with_full_advance() {
        let style = StyleConfig::default();
        let fonts = builtin_fonts(&style, 1500);
        let result = layout("A\n\nB", 1000, 1500, &style, &fonts);

        assert_eq!(result.lines.len(), 3);
        assert_eq!(line_text(&result.lines[0]), "A");
        assert!(result.lines[1].runs.is_empty());
        assert_eq!(line_text(&result.lines[2]), "B");

        // The blank middle line still advances the cursor by a full step.
        let step1 = result.lines[1].y - result.lines[0].y;
        let step2 = result.lines[2].y - result.lines[1].y;
        assert_relative_eq!(step1, result.advance);
        assert_relative_eq!(step2, result.advance);
        assert_relative_eq!(result.height, 3.0 * result.advance);
    }

    #[test]
    fn test_empty_caption_yields_empty_layout() {
        let style = StyleConfig::default();
        let fonts = builtin_fonts(&style, 1500);
        assert!(layout("", 1000, 1500, &style, &fonts).is_empty());
        assert!(layout("   \n\t\n  ", 1000, 1500, &style, &fonts).is_empty());
    }

    #[test]
    fn test_first_line_emphasized() {
        let style = StyleConfig::default();
        let fonts = builtin_fonts(&style, 1500);
        let result = layout("first\nsecond\nthird", 1000, 1500, &style, &fonts);

        let first = result.lines[0].font_size;
        for line in &result.lines[1..] {
            assert!(first >= line.font_size);
        }
        assert_eq!(first, style.first_line_size(1500));
        assert_eq!(result.lines[1].font_size, style.base_font_size(1500));
    }

    #[test]
    fn test_lines_centered_independently() {
        let style = StyleConfig {
            offset_x: 0,
            ..StyleConfig::default()
        };
        let fonts = builtin_fonts(&style, 1500);
        let result = layout("AAAA\nAA", 1000, 1500, &style, &fonts);

        // A narrower line starts further right than a wider one.
        let x0 = result.lines[0].runs[0].x;
        let x1 = result.lines[1].runs[0].x;
        assert!(x1 > x0);
        assert_relative_eq!(x1, (1000.0 - result.lines[1].width) / 2.0);
    }

    #[test]
    fn test_horizontal_offset_shifts_block() {
        let base = StyleConfig {
            offset_x: 0,
            ..StyleConfig::default()
        };
        let nudged = StyleConfig {
            offset_x: -30,
            ..StyleConfig::default()
        };
        let fonts = builtin_fonts(&base, 1500);

        let a = layout("HELLO", 1000, 1500, &base, &fonts);
        let b = layout("HELLO", 1000, 1500, &nudged, &fonts);
        assert_relative_eq!(b.lines[0].runs[0].x, a.lines[0].runs[0].x - 30.0);
    }

    #[test]
    fn test_vertical_anchor_and_offset() {
        let style = StyleConfig::default();
        let fonts = builtin_fonts(&style, 1500);
        let result = layout("HELLO", 1000, 1500, &style, &fonts);

        let expected = 0.88 * 1500.0 - 40.0;
        assert_relative_eq!(result.lines[0].y, expected);
    }

    #[test]
    fn test_long_unbreakable_token_respects_width_bound() {
        let style = StyleConfig {
            max_width_frac: 0.5,
            ..StyleConfig::default()
        };
        let fonts = builtin_fonts(&style, 1500);
        let token: String = std::iter::repeat('X').take(200).collect();
        let result = layout(&token, 800, 1500, &style, &fonts);

        assert!(!result.is_empty());
        for line in &result.lines {
            assert!(
                line.width <= 400.0,
                "line width {} exceeds 400px bound",
                line.width
            );
            assert!(!line.runs.is_empty());
        }
    }

    #[test]
    fn test_overwide_single_char_still_reserved() {
        let style = StyleConfig {
            // 1% of a 100px canvas: even one builtin glyph (6px) overflows.
            max_width_frac: 0.01,
            ..StyleConfig::default()
        };
        let fonts = builtin_fonts(&style, 1500);
        let result = layout("WIDE", 100, 1500, &style, &fonts);

        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].runs.len(), 1);
        assert_eq!(result.lines[0].runs[0].ch, 'W');
    }

    #[test]
    fn test_char_spacing_advances_cursor() {
        let style = StyleConfig {
            offset_x: 0,
            char_spacing: 2.0,
            ..StyleConfig::default()
        };
        let fonts = builtin_fonts(&style, 1500);
        let result = layout("AB", 1000, 1500, &style, &fonts);

        let runs = &result.lines[0].runs;
        assert_eq!(runs.len(), 2);
        // Builtin advance 6.0 plus 2.0 spacing.
        assert_relative_eq!(runs[1].x - runs[0].x, 8.0);
    }

    #[test]
    fn test_wrap_budget_greedy() {
        let segments = wrap_budget("aaaa bbbb cccc", 9);
        assert_eq!(segments, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_wrap_budget_collapses_whitespace() {
        let segments = wrap_budget("  spaced    out  ", 60);
        assert_eq!(segments, vec!["spaced out"]);
    }

    #[test]
    fn test_wrap_budget_hard_breaks_long_word() {
        let word: String = std::iter::repeat('x').take(130).collect();
        let segments = wrap_budget(&word, 60);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].chars().count(), 60);
        assert_eq!(segments[1].chars().count(), 60);
        assert_eq!(segments[2].chars().count(), 10);
    }

    #[test]
    fn test_wrap_caption_splits_at_sixty() {
        let style = StyleConfig::default();
        let fonts = builtin_fonts(&style, 1500);
        // 26 chars + space + 40 chars: greedy wrap puts them on two lines.
        let text = format!(
            "{} {}",
            "a".repeat(26),
            "b".repeat(40)
        );
        let result = layout(&text, 10_000, 1500, &style, &fonts);
        assert_eq!(result.lines.len(), 2);
        assert_eq!(line_text(&result.lines[0]), "a".repeat(26));
        assert_eq!(line_text(&result.lines[1]), "b".repeat(40));
    }
}
