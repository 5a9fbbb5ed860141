use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Timestamp layout of exported chat lines: "[31/12/2024, 23:59:59]".
pub const SOURCE_TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Timestamp layout of rendered messages: "[2024-12-31 23:59:59]".
pub const NORMALIZED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder rendered in place of a missing timestamp.
pub const UNKNOWN_TIMESTAMP: &str = "unknown";

/// What a message carries. Anything other than `Text` is a media placeholder
/// such as "image omitted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Video,
    Audio,
    Sticker,
    Gif,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Video => "video",
            MessageKind::Audio => "audio",
            MessageKind::Sticker => "sticker",
            MessageKind::Gif => "gif",
        }
    }
}

impl std::str::FromStr for MessageKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "text" => MessageKind::Text,
            "image" => MessageKind::Image,
            "video" => MessageKind::Video,
            "audio" => MessageKind::Audio,
            "sticker" => MessageKind::Sticker,
            "gif" => MessageKind::Gif,
            _ => return Err(ParseError::UnknownMessageKind(s.to_string())),
        })
    }
}

/// A single chat message reconstructed from one logical transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// None when the entry carried no recognizable timestamp
    pub timestamp: Option<NaiveDateTime>,
    pub sender: String,
    pub content: String,
    pub kind: MessageKind,
}

impl Message {
    /// Renders the message back into the exported chat line format,
    /// `[DD/MM/YYYY, HH:MM:SS] sender: content`.
    pub fn to_transcript_line(&self) -> String {
        let stamp = match self.timestamp {
            Some(ts) => ts.format(SOURCE_TIMESTAMP_FORMAT).to_string(),
            None => UNKNOWN_TIMESTAMP.to_string(),
        };
        format!("[{}] {}: {}", stamp, self.sender, self.content)
    }
}

/// Normalized rendering, `[YYYY-MM-DD HH:MM:SS] sender: content`. This is the
/// form the segmenter, sender extractor and chunk builder consume.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp {
            Some(ts) => write!(
                f,
                "[{}] {}: {}",
                ts.format(NORMALIZED_TIMESTAMP_FORMAT),
                self.sender,
                self.content
            ),
            None => write!(f, "[{}] {}: {}", UNKNOWN_TIMESTAMP, self.sender, self.content),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unknown Format: {0}")]
    UnknownTranscriptFormat(String),
    #[error("Unknown message kind: {0}")]
    UnknownMessageKind(String),
}

pub trait FormatParser {
    fn parse(&self, input: &str) -> Result<Vec<Message>, ParseError>;
}
