use super::{assemble_entries, detect_kind};
use crate::transcript::types::{
    FormatParser, Message, ParseError, NORMALIZED_TIMESTAMP_FORMAT, UNKNOWN_TIMESTAMP,
};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static MESSAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}|unknown)\] ([^:]+): (.*)")
        .expect("normalized message pattern is valid")
});

/// Parses transcripts that were already rendered with `Message`'s `Display`
/// impl, i.e. `[YYYY-MM-DD HH:MM:SS] sender: content` lines. An `[unknown]`
/// stamp is accepted and yields a message without a timestamp.
pub struct NormalizedTranscriptParser;

impl NormalizedTranscriptParser {
    pub const FORMAT: &'static str = "normalized";

    fn parse_entry(entry: &str) -> Option<Message> {
        let caps = MESSAGE_PATTERN.captures(entry)?;
        let timestamp = match &caps[1] {
            UNKNOWN_TIMESTAMP => None,
            stamp => Some(NaiveDateTime::parse_from_str(stamp, NORMALIZED_TIMESTAMP_FORMAT).ok()?),
        };
        let content = caps[3].trim();

        Some(Message {
            timestamp,
            sender: caps[2].trim().to_string(),
            content: content.to_string(),
            kind: detect_kind(content),
        })
    }
}

impl FormatParser for NormalizedTranscriptParser {
    fn parse(&self, input: &str) -> Result<Vec<Message>, ParseError> {
        let entries = assemble_entries(input, |line| MESSAGE_PATTERN.is_match(line));
        Ok(entries
            .iter()
            .filter_map(|entry| {
                let message = Self::parse_entry(entry);
                if message.is_none() {
                    debug!(entry = %entry, "dropping malformed normalized entry");
                }
                message
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::types::MessageKind;

    #[test]
    fn test_display_roundtrip_through_normalized_parser() {
        let text = "[2024-01-01 10:00:00] Alice: hi\n[unknown] Bob: video omitted\ncarried on";
        let messages = NormalizedTranscriptParser.parse(text).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].timestamp.is_some());
        assert_eq!(messages[1].timestamp, None);
        assert_eq!(messages[1].kind, MessageKind::Video);
        assert_eq!(messages[1].content, "video omitted carried on");

        let rendered: Vec<String> = messages.iter().map(|m| m.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "[2024-01-01 10:00:00] Alice: hi",
                "[unknown] Bob: video omitted carried on"
            ]
        );
    }

    #[test]
    fn test_source_format_lines_are_not_normalized() {
        let messages = NormalizedTranscriptParser
            .parse("[01/03/2024, 10:00:00] Real: first")
            .unwrap();
        assert!(messages.is_empty());
    }
}
