use super::{assemble_entries, detect_kind};
use crate::transcript::types::{FormatParser, Message, ParseError, SOURCE_TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// `[DD/MM/YYYY, HH:MM:SS] sender: content`. The sender runs up to the first colon.
static MESSAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{2}/\d{2}/\d{4}, \d{2}:\d{2}:\d{2})\] ([^:]+): (.*)")
        .expect("message pattern is valid")
});

/// Parses exported chat transcripts, one logical message per timestamped
/// entry, possibly continued over several physical lines.
pub struct WhatsAppParser;

impl WhatsAppParser {
    pub const FORMAT: &'static str = "whatsapp";

    /// Strict pass over one assembled entry. Returns None when the entry does
    /// not match the full pattern or its timestamp is not a real date/time.
    fn parse_entry(entry: &str) -> Option<Message> {
        let caps = MESSAGE_PATTERN.captures(entry)?;
        let timestamp = NaiveDateTime::parse_from_str(&caps[1], SOURCE_TIMESTAMP_FORMAT).ok()?;
        let content = caps[3].trim();

        Some(Message {
            timestamp: Some(timestamp),
            sender: caps[2].trim().to_string(),
            content: content.to_string(),
            kind: detect_kind(content),
        })
    }
}

impl FormatParser for WhatsAppParser {
    fn parse(&self, input: &str) -> Result<Vec<Message>, ParseError> {
        let entries = assemble_entries(input, |line| MESSAGE_PATTERN.is_match(line));

        let mut messages = Vec::with_capacity(entries.len());
        for entry in &entries {
            match Self::parse_entry(entry) {
                Some(message) => messages.push(message),
                None => debug!(entry = %entry, "dropping malformed transcript entry"),
            }
        }

        debug!(
            entries = entries.len(),
            messages = messages.len(),
            "parsed whatsapp transcript"
        );
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::types::MessageKind;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_whatsapp_parser() {
        let transcript_text = "[01/03/2024, 09:15:02] Dana Levi: morning all\n\
[01/03/2024, 09:15:40] Omer: who is bringing the grill\n\
on saturday?\n\
\n\
[01/03/2024, 09:16:01] Dana Levi: image omitted\n";
        let messages = WhatsAppParser.parse(transcript_text).unwrap();
        assert_eq!(messages.len(), 3);

        assert_eq!(messages[0].timestamp, Some(at(1, 9, 15, 2)));
        assert_eq!(messages[0].sender, "Dana Levi");
        assert_eq!(messages[0].content, "morning all");
        assert_eq!(messages[0].kind, MessageKind::Text);

        assert_eq!(messages[1].sender, "Omer");
        assert_eq!(messages[1].content, "who is bringing the grill on saturday?");

        assert_eq!(messages[2].kind, MessageKind::Image);
        assert_eq!(messages[2].content, "image omitted");
    }

    #[test]
    fn test_sender_stops_at_first_colon() {
        let messages = WhatsAppParser
            .parse("[02/03/2024, 10:00:00] Noa: meeting at 10:30: bring snacks")
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "Noa");
        assert_eq!(messages[0].content, "meeting at 10:30: bring snacks");
    }

    #[test]
    fn test_invalid_calendar_date_is_dropped() {
        let transcript_text = "[31/02/2024, 10:00:00] Ghost: never happened\n\
[01/03/2024, 10:00:00] Real: still here";
        let messages = WhatsAppParser.parse(transcript_text).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "Real");
    }

    #[test]
    fn test_leading_continuation_lines_are_dropped() {
        let transcript_text = "Messages and calls are end-to-end encrypted.\n\
[01/03/2024, 10:00:00] Real: first";
        let messages = WhatsAppParser.parse(transcript_text).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "first");
    }

    #[test]
    fn test_empty_input() {
        assert!(WhatsAppParser.parse("").unwrap().is_empty());
        assert!(WhatsAppParser.parse("\n\n  \n").unwrap().is_empty());
    }

    #[test]
    fn test_transcript_line_reparses_to_same_message() {
        let original = Message {
            timestamp: Some(at(5, 23, 59, 58)),
            sender: "Yael".to_string(),
            content: "sticker omitted".to_string(),
            kind: MessageKind::Sticker,
        };
        let reparsed = WhatsAppParser.parse(&original.to_transcript_line()).unwrap();
        assert_eq!(reparsed, vec![original]);
    }
}
