use super::LayoutError;
use ab_glyph::{point, Font, FontArc, GlyphId, OutlinedGlyph, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use std::path::Path;

/// Pixel size of a rendered line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

/// Glyph-metrics capability for one fixed font resource.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font_size: u32) -> Result<TextExtent, LayoutError>;
}

/// Draws a line of text onto an RGB canvas. `(x, y)` is the top-left corner
/// of the line box, i.e. the ascender line at the left edge.
pub trait GlyphRenderer {
    fn draw_text(
        &self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        font_size: u32,
        color: Rgb<u8>,
    ) -> Result<(), LayoutError>;
}

/// A TrueType/OpenType font that can both measure and draw text.
#[derive(Clone)]
pub struct GlyphFont {
    font: FontArc,
}

impl GlyphFont {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LayoutError> {
        let font =
            FontArc::try_from_vec(data).map_err(|e| LayoutError::InvalidFont(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// `font_size` is the em size in pixels. `PxScale` is the ascent to
    /// descent height, so the em size is scaled by that height over the em.
    fn px_scale(&self, font_size: u32) -> PxScale {
        let em = font_size as f32;
        match self.font.units_per_em() {
            Some(units_per_em) => PxScale::from(em * self.font.height_unscaled() / units_per_em),
            None => PxScale::from(em),
        }
    }

    /// Lays glyphs out left to right from the origin, baseline at the ascent.
    /// Glyphs without an outline (spaces) only advance the caret.
    fn outline_line(&self, text: &str, font_size: u32) -> Vec<OutlinedGlyph> {
        let scale = self.px_scale(font_size);
        let scaled = self.font.as_scaled(scale);
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        let mut outlined = Vec::new();

        for c in text.chars().filter(|c| !c.is_control()) {
            let id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);
            previous = Some(id);
            if let Some(glyph) = self.font.outline_glyph(glyph) {
                outlined.push(glyph);
            }
        }

        outlined
    }
}

impl TextMeasurer for GlyphFont {
    /// Ink bounding box of the line.
    fn measure(&self, text: &str, font_size: u32) -> Result<TextExtent, LayoutError> {
        let glyphs = self.outline_line(text, font_size);
        let mut bounds = glyphs.iter().map(OutlinedGlyph::px_bounds);
        let Some(first) = bounds.next() else {
            return Ok(TextExtent::default());
        };
        let (min, max) = bounds.fold((first.min, first.max), |(min, max), b| {
            (
                point(min.x.min(b.min.x), min.y.min(b.min.y)),
                point(max.x.max(b.max.x), max.y.max(b.max.y)),
            )
        });
        Ok(TextExtent {
            width: (max.x.ceil() - min.x.floor()).max(0.0) as u32,
            height: (max.y.ceil() - min.y.floor()).max(0.0) as u32,
        })
    }
}

impl GlyphRenderer for GlyphFont {
    fn draw_text(
        &self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        font_size: u32,
        color: Rgb<u8>,
    ) -> Result<(), LayoutError> {
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);
        for glyph in self.outline_line(text, font_size) {
            let bounds = glyph.px_bounds();
            let left = x + bounds.min.x as i32;
            let top = y + bounds.min.y as i32;
            glyph.draw(|gx, gy, coverage| {
                let (px, py) = (left + gx as i32, top + gy as i32);
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                blend(canvas.get_pixel_mut(px as u32, py as u32), color, coverage);
            });
        }
        Ok(())
    }
}

fn blend(pixel: &mut Rgb<u8>, color: Rgb<u8>, coverage: f32) {
    let alpha = coverage.clamp(0.0, 1.0);
    for (channel, target) in pixel.0.iter_mut().zip(color.0) {
        let mixed = f32::from(*channel) * (1.0 - alpha) + f32::from(target) * alpha;
        *channel = mixed.round() as u8;
    }
}

/// Fixed-cell stand-in for a real font: every char is a `0.6 * size` wide,
/// `size` tall cell; non-space chars are drawn as solid blocks.
#[cfg(test)]
pub(crate) struct BlockFont;

#[cfg(test)]
impl BlockFont {
    pub(crate) fn cell_width(font_size: u32) -> u32 {
        (font_size * 3).div_ceil(5)
    }
}

#[cfg(test)]
impl TextMeasurer for BlockFont {
    fn measure(&self, text: &str, font_size: u32) -> Result<TextExtent, LayoutError> {
        let chars = text.chars().count() as u32;
        if chars == 0 {
            return Ok(TextExtent::default());
        }
        Ok(TextExtent {
            width: chars * Self::cell_width(font_size),
            height: font_size,
        })
    }
}

#[cfg(test)]
impl GlyphRenderer for BlockFont {
    fn draw_text(
        &self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        font_size: u32,
        color: Rgb<u8>,
    ) -> Result<(), LayoutError> {
        let cell = Self::cell_width(font_size) as i32;
        for (i, c) in text.chars().enumerate() {
            if c == ' ' {
                continue;
            }
            let left = x + i as i32 * cell;
            for py in y.max(0)..(y + font_size as i32).min(canvas.height() as i32) {
                for px in left.max(0)..(left + cell - 1).min(canvas.width() as i32) {
                    canvas.put_pixel(px as u32, py as u32, color);
                }
            }
        }
        Ok(())
    }
}

/// DejaVu Sans, bundled for tests under `testdata/fonts`.
#[cfg(test)]
pub(crate) fn dejavu_sans() -> GlyphFont {
    static DEJAVU_SANS: &[u8] = include_bytes!("../../testdata/fonts/DejaVuSans.ttf");
    GlyphFont::from_bytes(DEJAVU_SANS.to_vec()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_invalid_font_bytes() {
        let result = GlyphFont::from_bytes(vec![0, 1, 2, 3]);
        assert!(matches!(result, Err(LayoutError::InvalidFont(_))));
    }

    #[test]
    fn test_missing_font_file() {
        let result = GlyphFont::from_path("/nonexistent/fonts/missing.ttf");
        assert!(matches!(result, Err(LayoutError::Io(_))));
    }

    #[test]
    fn test_blend() {
        let mut pixel = Rgb([0, 0, 0]);
        blend(&mut pixel, Rgb([255, 255, 255]), 1.0);
        assert_eq!(pixel, Rgb([255, 255, 255]));

        let mut pixel = Rgb([0, 100, 200]);
        blend(&mut pixel, Rgb([255, 255, 255]), 0.0);
        assert_eq!(pixel, Rgb([0, 100, 200]));

        let mut pixel = Rgb([0, 0, 0]);
        blend(&mut pixel, Rgb([200, 100, 50]), 0.5);
        assert_eq!(pixel, Rgb([100, 50, 25]));
    }

    #[test]
    fn test_block_font_metrics() {
        assert_eq!(
            BlockFont.measure("abcd", 10).unwrap(),
            TextExtent {
                width: 24,
                height: 10
            }
        );
        assert_eq!(BlockFont.measure("", 10).unwrap(), TextExtent::default());
    }

    #[test]
    fn test_glyph_font_size_is_em_size() {
        // DejaVu Sans caps are 1493/2048 of the em
        let cap = dejavu_sans().measure("H", 100).unwrap();
        assert!((72..=75).contains(&cap.height), "cap height {}", cap.height);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_glyph_font_blank_text_has_no_extent(#[case] text: &str) {
        assert_eq!(dejavu_sans().measure(text, 40).unwrap(), TextExtent::default());
    }

    #[test]
    fn test_glyph_font_extent_grows_with_size() {
        let font = dejavu_sans();
        let small = font.measure("WHEN THE CHAT", 20).unwrap();
        let large = font.measure("WHEN THE CHAT", 40).unwrap();
        assert!(small.width > 0 && small.height > 0);
        assert!(large.width > small.width);
        assert!(large.height > small.height);
        assert_eq!(font.measure("WHEN THE CHAT", 40).unwrap(), large);
    }

    #[test]
    fn test_glyph_font_draws_below_and_right_of_origin() {
        let font = dejavu_sans();
        let mut canvas = RgbImage::new(200, 100);
        font.draw_text(&mut canvas, 10, 10, "HI", 40, Rgb([255, 255, 255]))
            .unwrap();

        let painted: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != [0, 0, 0])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!painted.is_empty());
        assert!(painted.iter().all(|&(x, y)| x >= 10 && y >= 10));
        // stems of H and I are fully covered
        assert!(canvas.pixels().any(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_glyph_font_clips_at_canvas_edges() {
        let font = dejavu_sans();
        let mut canvas = RgbImage::new(30, 30);
        font.draw_text(&mut canvas, -20, -25, "WIDE TEXT", 60, Rgb([255, 0, 0]))
            .unwrap();
        font.draw_text(&mut canvas, 25, 25, "WIDE TEXT", 60, Rgb([255, 0, 0]))
            .unwrap();
    }
}
