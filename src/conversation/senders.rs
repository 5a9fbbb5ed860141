use std::collections::BTreeSet;

/// Collects the distinct sender names of rendered messages, sorted.
///
/// The sender is whatever sits between the first `]` and the next `:`.
/// Messages without a `]` are skipped.
pub fn extract_senders<S: AsRef<str>>(messages: &[S]) -> Vec<String> {
    let senders: BTreeSet<String> = messages
        .iter()
        .filter_map(|message| {
            let (_, rest) = message.as_ref().split_once(']')?;
            let sender = rest.split_once(':').map_or(rest, |(sender, _)| sender).trim();
            (!sender.is_empty()).then(|| sender.to_string())
        })
        .collect();
    senders.into_iter().collect()
}

/// Caller-side naming convention: the lexicographically last sender is
/// treated as the group name and the rest as members. Nothing in the data
/// guarantees this.
pub fn split_group_name(mut senders: Vec<String>) -> (Vec<String>, Option<String>) {
    let group = senders.pop();
    (senders, group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_senders() {
        let messages = [
            "[2024-01-01 10:00:00] Alice: hi",
            "[2024-01-01 10:00:05] Bob: yo",
        ];
        assert_eq!(extract_senders(&messages), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_extract_senders_dedups_and_sorts() {
        let messages = vec![
            "[2024-01-01 10:00:00] Zoe: a".to_string(),
            "[2024-01-01 10:00:01]  Alice : b".to_string(),
            "[2024-01-01 10:00:02] Zoe: c".to_string(),
            "[2024-01-01 10:00:03] : nobody".to_string(),
            "no bracket here: skipped".to_string(),
            "[unknown] Mike".to_string(),
        ];
        assert_eq!(extract_senders(&messages), vec!["Alice", "Mike", "Zoe"]);
    }

    #[test]
    fn test_split_group_name() {
        let senders = vec!["Alice".to_string(), "Bob".to_string(), "Weekend Crew".to_string()];
        let (members, group) = split_group_name(senders);
        assert_eq!(members, vec!["Alice", "Bob"]);
        assert_eq!(group.as_deref(), Some("Weekend Crew"));

        let (members, group) = split_group_name(Vec::new());
        assert!(members.is_empty());
        assert_eq!(group, None);
    }
}
