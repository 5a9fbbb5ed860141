use super::caption::CaptionPair;
use super::fit::{FontFit, FontFitSolver};
use super::font::{GlyphFont, GlyphRenderer, TextMeasurer};
use super::LayoutError;
use crate::config::MemeConfig;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const FILL_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Where one caption line goes on the canvas; `(x, y)` is its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Placement of both caption lines at one font size. Derived per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutResult {
    pub font_size: u32,
    pub best_effort: bool,
    pub top_box: TextBox,
    pub bottom_box: TextBox,
}

/// Places two caption lines on a canvas, draws them with an outline halo and
/// persists the result.
#[derive(Debug, Clone)]
pub struct MemeCompositor {
    solver: FontFitSolver,
    margin_ratio: f64,
    stroke_width: u32,
    jpeg_quality: u8,
}

impl Default for MemeCompositor {
    fn default() -> Self {
        Self::from_config(&MemeConfig::default())
    }
}

impl MemeCompositor {
    pub fn from_config(config: &MemeConfig) -> Self {
        Self {
            solver: FontFitSolver::from_config(config),
            margin_ratio: config.margin_ratio,
            stroke_width: config.stroke_width,
            jpeg_quality: config.jpeg_quality,
        }
    }

    pub fn solver(&self) -> &FontFitSolver {
        &self.solver
    }

    /// Positions both lines at `font_size`: the top line `margin_ratio` of the
    /// height below the top edge, the bottom line ending the same distance
    /// above the bottom edge, each centred horizontally.
    pub fn layout<M: TextMeasurer + ?Sized>(
        &self,
        canvas_width: u32,
        canvas_height: u32,
        caption: &CaptionPair,
        fit: FontFit,
        measurer: &M,
    ) -> Result<LayoutResult, LayoutError> {
        let top = measurer.measure(&caption.top_text, fit.size)?;
        let bottom = measurer.measure(&caption.bottom_text, fit.size)?;

        let margin_y = (f64::from(canvas_height) * self.margin_ratio) as i64;
        let centred =
            |line_width: u32| (i64::from(canvas_width) - i64::from(line_width)).div_euclid(2);

        Ok(LayoutResult {
            font_size: fit.size,
            best_effort: fit.best_effort,
            top_box: TextBox {
                x: centred(top.width) as i32,
                y: margin_y as i32,
                width: top.width,
                height: top.height,
            },
            bottom_box: TextBox {
                x: centred(bottom.width) as i32,
                y: (i64::from(canvas_height) - margin_y - i64::from(bottom.height)) as i32,
                width: bottom.width,
                height: bottom.height,
            },
        })
    }

    /// Solves the font size for `caption` on a canvas and lays it out.
    pub fn plan<M: TextMeasurer + ?Sized>(
        &self,
        canvas_width: u32,
        canvas_height: u32,
        caption: &CaptionPair,
        measurer: &M,
    ) -> Result<LayoutResult, LayoutError> {
        let fit = self.solver.fit(
            &caption.top_text,
            &caption.bottom_text,
            canvas_width,
            canvas_height,
            measurer,
        )?;
        self.layout(canvas_width, canvas_height, caption, fit, measurer)
    }

    /// Draws both caption lines onto `canvas` at `font_size`: four outline
    /// passes offset by the stroke width, then the fill on top.
    pub fn compose<M, R>(
        &self,
        canvas: &mut RgbImage,
        caption: &CaptionPair,
        font_size: u32,
        measurer: &M,
        renderer: &R,
    ) -> Result<LayoutResult, LayoutError>
    where
        M: TextMeasurer + ?Sized,
        R: GlyphRenderer + ?Sized,
    {
        let fit = FontFit {
            size: font_size,
            best_effort: false,
        };
        let layout = self.layout(canvas.width(), canvas.height(), caption, fit, measurer)?;

        self.draw_outlined(canvas, layout.top_box, &caption.top_text, font_size, renderer)?;
        self.draw_outlined(
            canvas,
            layout.bottom_box,
            &caption.bottom_text,
            font_size,
            renderer,
        )?;
        Ok(layout)
    }

    fn draw_outlined<R: GlyphRenderer + ?Sized>(
        &self,
        canvas: &mut RgbImage,
        at: TextBox,
        text: &str,
        font_size: u32,
        renderer: &R,
    ) -> Result<(), LayoutError> {
        let stroke = self.stroke_width as i32;
        for (dx, dy) in [(-stroke, 0), (stroke, 0), (0, -stroke), (0, stroke)] {
            renderer.draw_text(canvas, at.x + dx, at.y + dy, text, font_size, OUTLINE_COLOR)?;
        }
        renderer.draw_text(canvas, at.x, at.y, text, font_size, FILL_COLOR)
    }

    /// JPEG bytes of the canvas at the configured quality.
    pub fn encode_jpeg(&self, canvas: &RgbImage) -> Result<Vec<u8>, LayoutError> {
        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality);
        canvas.write_with_encoder(encoder)?;
        Ok(bytes)
    }

    /// Writes the canvas to `output_path`. `.jpg`/`.jpeg` (and paths without
    /// an extension) go through the fixed-quality JPEG encoder; any other
    /// extension picks its format from the extension.
    pub fn save<P: AsRef<Path>>(
        &self,
        canvas: &RgbImage,
        output_path: P,
    ) -> Result<(), LayoutError> {
        let output_path = output_path.as_ref();
        let extension = output_path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

        match extension.as_deref() {
            None | Some("jpg") | Some("jpeg") => {
                let mut writer = BufWriter::new(File::create(output_path)?);
                let encoder = JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality);
                canvas.write_with_encoder(encoder)?;
                writer.flush()?;
            }
            Some(_) => canvas.save(output_path)?,
        }
        info!(path = %output_path.display(), "saved meme");
        Ok(())
    }

    /// Loads a template image, fits and draws the caption with `font`, and
    /// saves the result to `output_path`.
    pub fn create_meme<P, Q>(
        &self,
        template_path: P,
        caption: &CaptionPair,
        output_path: Q,
        font: &GlyphFont,
    ) -> Result<LayoutResult, LayoutError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let mut canvas = image::open(template_path)?.to_rgb8();
        let plan = self.plan(canvas.width(), canvas.height(), caption, font)?;
        let layout = self.compose(&mut canvas, caption, plan.font_size, font, font)?;
        self.save(&canvas, output_path)?;
        Ok(LayoutResult {
            best_effort: plan.best_effort,
            ..layout
        })
    }
}
