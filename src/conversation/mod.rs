mod segmenter;
mod senders;

pub use segmenter::{ConversationBlock, ConversationSegmenter};
pub use senders::{extract_senders, split_group_name};

use crate::transcript::NORMALIZED_TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;

/// Reads the leading `[YYYY-MM-DD HH:MM:SS]` stamp of a rendered message.
/// Returns None when the brackets are missing or the stamp does not parse.
pub fn extract_timestamp(message: &str) -> Option<NaiveDateTime> {
    let start = message.find('[').map_or(0, |idx| idx + 1);
    let end = message.find(']')?;
    let stamp = message.get(start..end)?;
    NaiveDateTime::parse_from_str(stamp, NORMALIZED_TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("[2024-01-01 10:00:00] Alice: hi", Some("2024-01-01 10:00:00"))]
    #[case("[2024-01-01 10:00:00]", Some("2024-01-01 10:00:00"))]
    #[case("[unknown] Alice: hi", None)]
    #[case("[01/01/2024, 10:00:00] Alice: hi", None)]
    #[case("no brackets at all", None)]
    #[case("Alice: ] [2024-01-01 10:00:00]", None)]
    #[case("", None)]
    fn test_extract_timestamp(#[case] message: &str, #[case] expected: Option<&str>) {
        let expected = expected
            .map(|s| NaiveDateTime::parse_from_str(s, NORMALIZED_TIMESTAMP_FORMAT).unwrap());
        assert_eq!(extract_timestamp(message), expected);
    }
}
