//! Caption layout and rendering onto a template image.
//!
//! [`FontFitSolver`] picks one font size for both caption lines,
//! [`MemeCompositor`] places and draws them with an outline halo.
//! Font access goes through [`TextMeasurer`] and [`GlyphRenderer`] so the
//! layout maths can run against any font backend.

mod caption;
mod compose;
mod fit;
mod font;

use thiserror::Error;

pub use caption::{CaptionError, CaptionPair};
pub use compose::{LayoutResult, MemeCompositor, TextBox};
pub use fit::{FontFit, FontFitSolver};
pub use font::{GlyphFont, GlyphRenderer, TextExtent, TextMeasurer};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid font data: {0}")]
    InvalidFont(String),
    #[error("failed to measure text: {0}")]
    Measure(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
