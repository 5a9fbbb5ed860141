use super::font::TextMeasurer;
use super::LayoutError;
use crate::config::MemeConfig;
use tracing::warn;

/// Outcome of a font-size search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontFit {
    pub size: u32,
    /// Set when not even size 1 fits; `size` is then 1 and the text may overflow.
    pub best_effort: bool,
}

/// Finds the largest single font size at which both caption lines fit the
/// canvas: each line within `max_width_ratio` of the width, and both lines
/// plus the gap within the height left after the top and bottom margins.
#[derive(Debug, Clone)]
pub struct FontFitSolver {
    max_width_ratio: f64,
    margin_ratio: f64,
    line_gap_px: u32,
}

impl Default for FontFitSolver {
    fn default() -> Self {
        Self::from_config(&MemeConfig::default())
    }
}

impl FontFitSolver {
    pub fn new(max_width_ratio: f64, margin_ratio: f64, line_gap_px: u32) -> Self {
        Self {
            max_width_ratio,
            margin_ratio,
            line_gap_px,
        }
    }

    pub fn from_config(config: &MemeConfig) -> Self {
        Self::new(config.max_width_ratio, config.margin_ratio, config.line_gap_px)
    }

    /// Steps the size up from 1 until a size no longer fits, and returns the
    /// last one that did. Measurements are not assumed to be monotonic, so
    /// this walks every size instead of bisecting. No size above the canvas
    /// height is tried.
    pub fn fit<M: TextMeasurer + ?Sized>(
        &self,
        top_text: &str,
        bottom_text: &str,
        canvas_width: u32,
        canvas_height: u32,
        measurer: &M,
    ) -> Result<FontFit, LayoutError> {
        let mut best = FontFit {
            size: 1,
            best_effort: true,
        };

        for size in 1..=canvas_height {
            if !self.fits_at(size, top_text, bottom_text, canvas_width, canvas_height, measurer)? {
                break;
            }
            best = FontFit {
                size,
                best_effort: false,
            };
        }

        if best.best_effort {
            warn!(
                canvas_width,
                canvas_height, "caption does not fit even at size 1, text may overflow"
            );
        }
        Ok(best)
    }

    /// Whether both lines satisfy the width and combined-height budgets at `size`.
    pub fn fits_at<M: TextMeasurer + ?Sized>(
        &self,
        size: u32,
        top_text: &str,
        bottom_text: &str,
        canvas_width: u32,
        canvas_height: u32,
        measurer: &M,
    ) -> Result<bool, LayoutError> {
        let max_text_width = f64::from(canvas_width) * self.max_width_ratio;
        let vertical_space = f64::from(canvas_height) * (1.0 - 2.0 * self.margin_ratio);

        let top = measurer.measure(top_text, size)?;
        let bottom = measurer.measure(bottom_text, size)?;

        if f64::from(top.width) > max_text_width || f64::from(bottom.width) > max_text_width {
            return Ok(false);
        }
        let total_height =
            u64::from(top.height) + u64::from(self.line_gap_px) + u64::from(bottom.height);
        Ok(total_height as f64 <= vertical_space)
    }
}
