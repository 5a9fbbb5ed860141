mod normalized;
mod whatsapp;

pub use normalized::NormalizedTranscriptParser;
pub use whatsapp::WhatsAppParser;

use crate::transcript::types::{FormatParser, Message, MessageKind, ParseError};
use memchr::memchr;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Media placeholders inserted by the chat exporter in place of attachments.
static MEDIA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:image|video|audio|sticker|GIF) omitted").expect("media pattern is valid")
});

/// Returns the media kind named by the first "<kind> omitted" marker in the
/// content, or `MessageKind::Text` when there is none.
pub fn detect_kind(content: &str) -> MessageKind {
    MEDIA_PATTERN
        .find(content)
        .and_then(|m| m.as_str().split_whitespace().next())
        .and_then(|word| word.parse().ok())
        .unwrap_or(MessageKind::Text)
}

/// Groups physical lines into logical entries. A trimmed line for which
/// `starts_entry` holds opens a new entry; any other non-empty line is a
/// continuation and is joined onto the open entry with a single space.
/// Continuations seen before the first opening line form an entry of their
/// own, which the strict pass will later reject.
pub fn assemble_entries<F>(input: &str, starts_entry: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut entries = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut pos = 0;

    while pos < len {
        let line_end = match memchr(b'\n', &bytes[pos..]) {
            Some(idx) => pos + idx,
            None => len,
        };
        // Slicing at '\n' always lands on a char boundary.
        let line = input[pos..line_end].trim();
        pos = line_end + 1;

        if starts_entry(line) {
            if !current.is_empty() {
                entries.push(current.join(" "));
                current.clear();
            }
            current.push(line);
        } else if !line.is_empty() {
            current.push(line);
        }
    }

    // Flush the last entry
    if !current.is_empty() {
        entries.push(current.join(" "));
    }

    entries
}

/// A registry to hold and expose parsers, keyed by transcript format name.
pub struct ParserRegistry {
    parsers: HashMap<String, Box<dyn FormatParser + Send + Sync>>,
}

impl ParserRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a new parser with the given key.
    pub fn register_parser(&mut self, key: &str, parser: Box<dyn FormatParser + Send + Sync>) {
        self.parsers.insert(key.to_string(), parser);
    }

    /// Retrieve and run the parser for the given key on the provided input.
    pub fn parse(&self, key: &str, input: &str) -> Result<Vec<Message>, ParseError> {
        if let Some(parser) = self.parsers.get(key) {
            parser.parse(input)
        } else {
            Err(ParseError::UnknownTranscriptFormat(key.to_string()))
        }
    }

    /// List the keys of all registered parsers, sorted.
    pub fn list_parsers(&self) -> Vec<&String> {
        let mut keys: Vec<&String> = self.parsers.keys().collect();
        keys.sort();
        keys
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = ParserRegistry::new();
        registry.register_parser(WhatsAppParser::FORMAT, Box::new(WhatsAppParser));
        registry.register_parser(
            NormalizedTranscriptParser::FORMAT,
            Box::new(NormalizedTranscriptParser),
        );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("IMAGE omitted", MessageKind::Image)]
    #[case("video omitted", MessageKind::Video)]
    #[case("\u{200e}audio omitted", MessageKind::Audio)]
    #[case("sticker omitted", MessageKind::Sticker)]
    #[case("GIF omitted", MessageKind::Gif)]
    #[case("look: image omitted and video omitted", MessageKind::Image)]
    #[case("an image that was not omitted", MessageKind::Text)]
    #[case("", MessageKind::Text)]
    fn test_detect_kind(#[case] content: &str, #[case] expected: MessageKind) {
        assert_eq!(detect_kind(content), expected);
    }

    #[test]
    fn test_assemble_entries_joins_continuations() {
        let input = "> first\ncontinued\n\n  and more  \n> second\r\n";
        let entries = assemble_entries(input, |line| line.starts_with('>'));
        assert_eq!(entries, vec!["> first continued and more", "> second"]);
    }

    #[test]
    fn test_assemble_entries_keeps_leading_orphans_separate() {
        let entries = assemble_entries("orphan\n> start", |line| line.starts_with('>'));
        assert_eq!(entries, vec!["orphan", "> start"]);
    }

    #[test]
    fn test_registry_lists_and_rejects_unknown() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.list_parsers(), vec!["normalized", "whatsapp"]);
        assert!(matches!(
            registry.parse("srt", "whatever"),
            Err(ParseError::UnknownTranscriptFormat(key)) if key == "srt"
        ));
    }
}
