//! Glyph rasterization onto the composited canvas.
//!
//! Outline faces are drawn by extracting skrifa outlines and rendering
//! them through zeno masks, then source-over blending the configured text
//! color. The built-in bitmap face stamps its 5x7 glyph grid directly.

use crate::error::{Error, Result};
use crate::fallback;
use crate::fonts::{Face, FontSet, LoadedFont};
use crate::layout::{GlyphRun, Layout};
use image::RgbaImage;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::MetadataProvider;
use zeno::{Command, Mask, Transform};

/// Draw every glyph run of a layout onto the canvas in the given color.
pub fn draw_layout(
    canvas: &mut RgbaImage,
    layout: &Layout,
    fonts: &FontSet,
    color: [u8; 3],
) -> Result<()> {
    for line in &layout.lines {
        for run in &line.runs {
            match fonts.face(run.size) {
                Face::Outline { font, size } => {
                    draw_outline_run(canvas, font, *size, run, color)?;
                }
                Face::Builtin => draw_bitmap_run(canvas, run, color),
            }
        }
    }
    Ok(())
}

/// Rasterize one outline glyph and blend it onto the canvas.
fn draw_outline_run(
    canvas: &mut RgbaImage,
    font: &LoadedFont,
    size: u32,
    run: &GlyphRun,
    color: [u8; 3],
) -> Result<()> {
    let font_ref = font.font_ref();
    let metrics = font_ref.metrics(Size::new(size as f32), LocationRef::default());
    let upem = metrics.units_per_em as f32;
    if upem <= 0.0 {
        return Err(Error::Internal("Font reports zero units per em".to_string()));
    }
    let scale = size as f32 / upem;

    let Some(glyph_id) = font_ref.charmap().map(run.ch) else {
        // Unmapped characters keep their advance but draw nothing.
        log::debug!("No glyph for {:?}, skipping", run.ch);
        return Ok(());
    };
    let Some(outline) = font_ref.outline_glyphs().get(glyph_id) else {
        // Spaces and other blank glyphs have no outline to draw.
        log::debug!("Glyph for {:?} has no outline", run.ch);
        return Ok(());
    };

    let mut commands = Vec::new();
    let mut pen = ZenoPen::new(&mut commands);
    let draw_settings = DrawSettings::unhinted(Size::unscaled(), LocationRef::default());
    outline.draw(draw_settings, &mut pen).map_err(|e| {
        Error::Internal(format!("Failed to draw outline for {:?}: {}", run.ch, e))
    })?;

    let baseline_y = run.y + metrics.ascent;
    let transform = Transform::scale(scale, scale).then_translate(run.x, baseline_y);

    let (width, height) = canvas.dimensions();
    let mut mask = Mask::new(commands.as_slice());
    mask.size(width, height).transform(Some(transform));
    let (alpha_data, placement) = mask.render();

    let top = placement.top.max(0) as u32;
    let left = placement.left.max(0) as u32;
    let bottom = (placement.top + placement.height as i32).min(height as i32).max(0) as u32;
    let right = (placement.left + placement.width as i32).min(width as i32).max(0) as u32;

    for py in top..bottom {
        for px in left..right {
            let mask_y = (py as i32 - placement.top) as u32;
            let mask_x = (px as i32 - placement.left) as u32;
            let mask_idx = (mask_y * placement.width + mask_x) as usize;

            let Some(&alpha) = alpha_data.get(mask_idx) else {
                continue;
            };
            if alpha == 0 {
                continue;
            }

            let sa = alpha as f32 / 255.0;
            let dst = canvas.get_pixel_mut(px, py);
            let da = dst.0[3] as f32 / 255.0;
            for c in 0..3 {
                let blended = color[c] as f32 * sa + dst.0[c] as f32 * (1.0 - sa);
                dst.0[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
            let out_a = sa + da * (1.0 - sa);
            dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }

    Ok(())
}

/// Stamp one built-in 5x7 glyph onto the canvas.
fn draw_bitmap_run(canvas: &mut RgbaImage, run: &GlyphRun, color: [u8; 3]) {
    let rows = fallback::glyph(run.ch);
    let x0 = run.x.round() as i64;
    let y0 = run.y.round() as i64;
    let (width, height) = canvas.dimensions();

    for (row_idx, row) in rows.iter().enumerate() {
        for col in 0..fallback::GLYPH_WIDTH {
            if row & (1 << (fallback::GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            let px = x0 + col as i64;
            let py = y0 + row_idx as i64;
            if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                continue;
            }
            let dst = canvas.get_pixel_mut(px as u32, py as u32);
            dst.0 = [color[0], color[1], color[2], 255];
        }
    }
}

/// Bounding box of pixels matching `color` within `tolerance` per channel,
/// as (x, y, width, height). `None` when nothing matches.
pub fn content_bbox(
    canvas: &RgbaImage,
    color: [u8; 3],
    tolerance: u8,
) -> Option<(u32, u32, u32, u32)> {
    let (width, height) = canvas.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    for (x, y, pixel) in canvas.enumerate_pixels() {
        let matches = pixel.0[..3]
            .iter()
            .zip(color.iter())
            .all(|(&have, &want)| have.abs_diff(want) <= tolerance);
        if matches {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x > max_x {
        return None;
    }
    Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Adapter to convert skrifa outline callbacks to a zeno command vector.
struct ZenoPen<'a> {
    commands: &'a mut Vec<Command>,
}

impl<'a> ZenoPen<'a> {
    fn new(commands: &'a mut Vec<Command>) -> Self {
        Self { commands }
    }
}

impl OutlinePen for ZenoPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        // Flip Y for graphics coordinates.
        self.commands.push(Command::MoveTo([x, -y].into()));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(Command::LineTo([x, -y].into()));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.commands
            .push(Command::QuadTo([cx0, -cy0].into(), [x, -y].into()));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.commands.push(Command::CurveTo(
            [cx0, -cy0].into(),
            [cx1, -cy1].into(),
            [x, -y].into(),
        ));
    }

    fn close(&mut self) {
        self.commands.push(Command::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontLibrary;
    use crate::layout::layout;
    use crate::style::StyleConfig;
    use camino::Utf8Path;
    use image::Rgba;

    fn dark_canvas(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([20, 20, 20, 255]))
    }

    fn builtin_layout(text: &str, width: u32, height: u32, style: &StyleConfig) -> (Layout, FontSet) {
        let library = FontLibrary::new(2);
        let fonts = library.resolve(
            Utf8Path::new("/no/such/font.ttf"),
            &[style.base_font_size(height), style.first_line_size(height)],
        );
        let laid = layout(text, width, height, style, &fonts);
        (laid, fonts)
    }

    #[test]
    fn test_draw_layout_stamps_text_color() {
        let style = StyleConfig::default();
        let mut canvas = dark_canvas(400, 600);
        let (laid, fonts) = builtin_layout("HELLO", 400, 600, &style);

        draw_layout(&mut canvas, &laid, &fonts, [255, 255, 255]).unwrap();

        let bbox = content_bbox(&canvas, [255, 255, 255], 0).expect("text pixels present");
        let (_, y, _, h) = bbox;
        // Block anchored near 88% of the canvas height, nudged up 40px.
        let expected_top = (0.88 * 600.0 - 40.0) as u32;
        assert!(y >= expected_top && y < expected_top + 10);
        assert!(h >= 1);
    }

    #[test]
    fn test_draw_layout_empty_is_noop() {
        let style = StyleConfig::default();
        let mut canvas = dark_canvas(100, 100);
        let snapshot = canvas.clone();
        let (laid, fonts) = builtin_layout("", 100, 100, &style);

        draw_layout(&mut canvas, &laid, &fonts, [255, 255, 255]).unwrap();
        assert_eq!(canvas, snapshot);
    }

    #[test]
    fn test_bitmap_run_clips_at_edges() {
        let mut canvas = dark_canvas(10, 10);
        let run = GlyphRun {
            ch: 'W',
            x: -3.0,
            y: 8.0,
            size: 10,
        };
        // Partially off-canvas glyphs draw their visible pixels only.
        draw_bitmap_run(&mut canvas, &run, [255, 0, 0]);
        assert!(content_bbox(&canvas, [255, 0, 0], 0).is_some());
    }

    #[test]
    fn test_content_bbox_empty_canvas() {
        let canvas = dark_canvas(50, 50);
        assert!(content_bbox(&canvas, [255, 255, 255], 0).is_none());
    }

    #[test]
    fn test_content_bbox_single_pixel() {
        let mut canvas = dark_canvas(100, 50);
        canvas.put_pixel(50, 25, Rgba([255, 255, 255, 255]));
        let bbox = content_bbox(&canvas, [255, 255, 255], 0).unwrap();
        assert_eq!(bbox, (50, 25, 1, 1));
    }

    #[test]
    fn test_content_bbox_rectangle() {
        let mut canvas = dark_canvas(100, 50);
        for y in 10..15 {
            for x in 20..30 {
                canvas.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let bbox = content_bbox(&canvas, [255, 255, 255], 0).unwrap();
        assert_eq!(bbox, (20, 10, 10, 5));
    }
}
