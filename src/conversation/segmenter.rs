use super::extract_timestamp;
use crate::config::SegmentationConfig;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

/// An ordered, non-empty run of rendered messages that belong together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationBlock {
    messages: Vec<String>,
}

impl ConversationBlock {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }

    /// One message per line, the text handed to the splitter.
    pub fn to_text(&self) -> String {
        self.messages.join("\n")
    }
}

/// Groups rendered messages (`[YYYY-MM-DD HH:MM:SS] sender: content`) into
/// conversations using a time-gap rule and a minimum conversation size.
#[derive(Debug, Clone)]
pub struct ConversationSegmenter {
    min_size: usize,
    max_gap_minutes: u32,
}

impl Default for ConversationSegmenter {
    fn default() -> Self {
        Self::from_config(&SegmentationConfig::default())
    }
}

impl ConversationSegmenter {
    /// A `min_size` of 0 is raised to 1 so every emitted block holds a message.
    pub fn new(min_size: usize, max_gap_minutes: u32) -> Self {
        Self {
            min_size: min_size.max(1),
            max_gap_minutes,
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new(config.min_messages, config.max_gap_minutes)
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Segments `messages` in two passes: split on large time gaps once the
    /// running conversation is big enough, then fold undersized runs forward.
    ///
    /// An input that never reaches `min_size` messages produces no blocks at
    /// all. Callers must treat an empty result as "nothing usable", not as
    /// success.
    pub fn segment<S: AsRef<str>>(&self, messages: &[S]) -> Vec<ConversationBlock> {
        let detected = self.detect_boundaries(messages);
        let normalized = self.normalize_sizes(detected);

        if normalized.is_empty() && !messages.is_empty() {
            warn!(
                messages = messages.len(),
                min_size = self.min_size,
                "too few messages to form a conversation"
            );
        }
        debug!(
            messages = messages.len(),
            blocks = normalized.len(),
            "segmented conversation"
        );

        normalized
            .into_iter()
            .map(|messages| ConversationBlock { messages })
            .collect()
    }

    fn detect_boundaries<S: AsRef<str>>(&self, messages: &[S]) -> Vec<Vec<String>> {
        let mut conversations: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut last_timestamp: Option<NaiveDateTime> = None;
        let max_gap_minutes = f64::from(self.max_gap_minutes);

        for message in messages {
            let message = message.as_ref();
            let Some(timestamp) = extract_timestamp(message) else {
                // Unknown time: stays with whatever conversation is open
                current.push(message.to_string());
                continue;
            };

            if let Some(last) = last_timestamp {
                let gap_minutes = (timestamp - last).num_seconds() as f64 / 60.0;
                if gap_minutes > max_gap_minutes && current.len() >= self.min_size {
                    conversations.push(std::mem::take(&mut current));
                }
            }
            current.push(message.to_string());
            last_timestamp = Some(timestamp);
        }

        if current.len() >= self.min_size {
            conversations.push(current);
        } else if let Some(last) = conversations.last_mut() {
            last.extend(current);
        }
        // else: no conversation yet, the short tail is dropped

        conversations
    }

    fn normalize_sizes(&self, conversations: Vec<Vec<String>>) -> Vec<Vec<String>> {
        let mut processed: Vec<Vec<String>> = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for conversation in conversations {
            pending.extend(conversation);
            if pending.len() >= self.min_size {
                processed.push(std::mem::take(&mut pending));
            }
        }

        if !pending.is_empty() {
            if let Some(last) = processed.last_mut() {
                last.extend(pending);
            } else if pending.len() >= self.min_size {
                processed.push(pending);
            }
        }

        processed
    }
}
