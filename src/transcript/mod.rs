mod parsers;
mod types;

pub use parsers::{
    assemble_entries, detect_kind, NormalizedTranscriptParser, ParserRegistry, WhatsAppParser,
};
pub use types::{
    FormatParser, Message, MessageKind, ParseError, NORMALIZED_TIMESTAMP_FORMAT,
    SOURCE_TIMESTAMP_FORMAT, UNKNOWN_TIMESTAMP,
};

/// Parses an exported chat transcript into messages, in input order.
/// Malformed entries are dropped; an input with no recognizable entries
/// yields an empty vector.
pub fn parse_transcript(raw_text: &str) -> Result<Vec<Message>, ParseError> {
    WhatsAppParser.parse(raw_text)
}

/// Renders messages into the normalized line form used downstream.
pub fn render_messages(messages: &[Message]) -> Vec<String> {
    messages.iter().map(ToString::to_string).collect()
}
