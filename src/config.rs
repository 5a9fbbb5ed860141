//! Runtime configuration.
//!
//! Every section deserializes with per-field defaults, so a partial JSON
//! document (or no document at all) yields a usable configuration.
//! `Settings::from_env` reads the environment variables below; unset
//! variables keep their defaults.
//!
//! | Env | Default |
//! |-----|---------|
//! | CONVERSATION_MIN_MESSAGES | 10 |
//! | CONVERSATION_MAX_GAP_MINUTES | 30 |
//! | CHUNK_SIZE | 2000 |
//! | CHUNK_OVERLAP | 200 |
//! | MEME_TEXT_MAX_WIDTH_RATIO | 0.9 |
//! | MEME_TEXT_MARGIN_RATIO | 0.1 |
//! | MEME_FONT_PATH | utils/fonts/Arial_Unicode.ttf |
//! | MEME_TEMPLATE_PATH | utils/9au02y.jpg |
//! | MEME_OUTPUT_PATH | output_meme.jpg |
//! | CHAT_FILE_PATH | unset |

use crate::chunking::splitter::RecursiveChunkLengthFunction;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("Invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

fn default_min_messages() -> usize {
    10
}

fn default_max_gap_minutes() -> u32 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Smallest conversation the segmenter will emit
    #[serde(default = "default_min_messages")]
    pub min_messages: usize,
    /// A silence longer than this may start a new conversation
    #[serde(default = "default_max_gap_minutes")]
    pub max_gap_minutes: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_messages: default_min_messages(),
            max_gap_minutes: default_max_gap_minutes(),
        }
    }
}

fn default_chunk_size() -> usize {
    2000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_separators() -> Vec<String> {
    vec!["\n\n".to_string(), "\n".to_string()]
}

fn default_length_function() -> RecursiveChunkLengthFunction {
    RecursiveChunkLengthFunction::CharacterCount
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Most to least preferred split points
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,
    #[serde(default = "default_length_function")]
    pub length_function: RecursiveChunkLengthFunction,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            separators: default_separators(),
            length_function: default_length_function(),
        }
    }
}

fn default_max_width_ratio() -> f64 {
    0.9
}

fn default_margin_ratio() -> f64 {
    0.1
}

fn default_line_gap_px() -> u32 {
    10
}

fn default_stroke_width() -> u32 {
    2
}

fn default_jpeg_quality() -> u8 {
    95
}

fn default_font_path() -> PathBuf {
    PathBuf::from("utils/fonts/Arial_Unicode.ttf")
}

fn default_template_path() -> PathBuf {
    PathBuf::from("utils/9au02y.jpg")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output_meme.jpg")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemeConfig {
    /// Widest a caption line may be, as a share of the canvas width
    #[serde(default = "default_max_width_ratio")]
    pub max_width_ratio: f64,
    /// Blank band kept above the top line and below the bottom line
    #[serde(default = "default_margin_ratio")]
    pub margin_ratio: f64,
    #[serde(default = "default_line_gap_px")]
    pub line_gap_px: u32,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl Default for MemeConfig {
    fn default() -> Self {
        Self {
            max_width_ratio: default_max_width_ratio(),
            margin_ratio: default_margin_ratio(),
            line_gap_px: default_line_gap_px(),
            stroke_width: default_stroke_width(),
            jpeg_quality: default_jpeg_quality(),
            font_path: default_font_path(),
            template_path: default_template_path(),
            output_path: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub meme: MemeConfig,
    #[serde(default)]
    pub chat_file_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from any key/value source shaped like the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        override_parsed(
            &lookup,
            "CONVERSATION_MIN_MESSAGES",
            &mut settings.segmentation.min_messages,
        )?;
        override_parsed(
            &lookup,
            "CONVERSATION_MAX_GAP_MINUTES",
            &mut settings.segmentation.max_gap_minutes,
        )?;
        override_parsed(&lookup, "CHUNK_SIZE", &mut settings.chunking.chunk_size)?;
        override_parsed(&lookup, "CHUNK_OVERLAP", &mut settings.chunking.chunk_overlap)?;
        override_parsed(&lookup, "MEME_TEXT_MAX_WIDTH_RATIO", &mut settings.meme.max_width_ratio)?;
        override_parsed(&lookup, "MEME_TEXT_MARGIN_RATIO", &mut settings.meme.margin_ratio)?;
        override_parsed(&lookup, "MEME_FONT_PATH", &mut settings.meme.font_path)?;
        override_parsed(&lookup, "MEME_TEMPLATE_PATH", &mut settings.meme.template_path)?;
        override_parsed(&lookup, "MEME_OUTPUT_PATH", &mut settings.meme.output_path)?;
        settings.chat_file_path = lookup("CHAT_FILE_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a JSON document; missing sections and fields
    /// take their defaults.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(document)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segmentation.min_messages == 0 {
            return Err(ConfigError::Validation(
                "min_messages must be at least 1".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Validation(
                "chunk_overlap must be smaller than chunk_size".to_string(),
            ));
        }
        let meme = &self.meme;
        if !(meme.max_width_ratio > 0.0 && meme.max_width_ratio <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "max_width_ratio must be in (0, 1], got {}",
                meme.max_width_ratio
            )));
        }
        if !(meme.margin_ratio >= 0.0 && meme.margin_ratio < 0.5) {
            return Err(ConfigError::Validation(format!(
                "margin_ratio must be in [0, 0.5), got {}",
                meme.margin_ratio
            )));
        }
        if meme.jpeg_quality == 0 || meme.jpeg_quality > 100 {
            return Err(ConfigError::Validation(format!(
                "jpeg_quality must be in 1..=100, got {}",
                meme.jpeg_quality
            )));
        }
        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(key) {
        *target = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        })?;
    }
    Ok(())
}
