use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("caption reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The two lines of a meme caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionPair {
    pub top_text: String,
    pub bottom_text: String,
}

impl CaptionPair {
    pub fn new(top_text: impl Into<String>, bottom_text: impl Into<String>) -> Self {
        Self {
            top_text: top_text.into(),
            bottom_text: bottom_text.into(),
        }
    }

    /// Reads a `{"top_text": .., "bottom_text": ..}` object out of a model
    /// reply, tolerating a surrounding ```json or ``` code fence.
    pub fn from_model_reply(reply: &str) -> Result<Self, CaptionError> {
        let body = strip_code_fence(reply.trim());
        Ok(serde_json::from_str(body.trim())?)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let (start, opener_len) = match text.find("```json") {
        Some(start) => (start, "```json".len()),
        None => match text.find("```") {
            Some(start) => (start, "```".len()),
            None => return text,
        },
    };
    let body_start = start + opener_len;
    match text.rfind("```") {
        Some(end) if end > body_start => &text[body_start..end],
        _ => &text[body_start..],
    }
}
