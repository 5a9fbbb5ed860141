use super::splitter::{ChunkingError, TextSplit, TextSplitter};
use crate::config::ChunkingConfig;
use crate::conversation::{extract_timestamp, ConversationBlock};
use crate::transcript::{NORMALIZED_TIMESTAMP_FORMAT, UNKNOWN_TIMESTAMP};
use serde::Serialize;
use tracing::debug;

pub const CONVERSATION_CHUNK_TYPE: &str = "conversation";

/// Retrieval metadata attached to every chunk handed to the index store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    pub chunk_type: String,
    /// Number of lines in the chunk
    pub message_count: usize,
    /// Length in characters
    pub length: usize,
    /// `YYYY-MM-DD HH:MM:SS` of the first line, or "unknown"
    pub start_time: String,
    /// `YYYY-MM-DD HH:MM:SS` of the last line, or "unknown"
    pub end_time: String,
}

/// A `(text, metadata)` record for the embedding index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    fn from_text(text: String) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let stamp = |line: Option<&&str>| {
            line.and_then(|line| extract_timestamp(line))
                .map(|ts| ts.format(NORMALIZED_TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| UNKNOWN_TIMESTAMP.to_string())
        };
        let metadata = ChunkMetadata {
            chunk_type: CONVERSATION_CHUNK_TYPE.to_string(),
            message_count: lines.len(),
            length: text.chars().count(),
            start_time: stamp(lines.first()),
            end_time: stamp(lines.last()),
        };
        Self { text, metadata }
    }
}

/// Cuts conversation blocks into retrieval chunks with a pluggable splitter.
pub struct ChunkMetadataBuilder<S = TextSplitter> {
    splitter: S,
}

impl ChunkMetadataBuilder<TextSplitter> {
    /// Line-preferring character splitter: 2000 characters, 200 overlap.
    pub fn with_defaults() -> Result<Self, ChunkingError> {
        Self::from_config(&ChunkingConfig::default())
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ChunkingError> {
        Ok(Self::new(TextSplitter::from_config(config)?))
    }
}

impl<S: TextSplit> ChunkMetadataBuilder<S> {
    pub fn new(splitter: S) -> Self {
        Self { splitter }
    }

    /// Splits the block's text (one message per line) and annotates each
    /// piece with its line count, character length and time span.
    pub fn build(&self, block: &ConversationBlock) -> Result<Vec<Chunk>, ChunkingError> {
        let raw_chunks = self.splitter.split(&block.to_text())?;
        debug!(
            messages = block.len(),
            chunks = raw_chunks.len(),
            "chunked conversation block"
        );
        Ok(raw_chunks.into_iter().map(Chunk::from_text).collect())
    }

    /// Chunks every block, preserving block order.
    pub fn build_all(&self, blocks: &[ConversationBlock]) -> Result<Vec<Chunk>, ChunkingError> {
        let mut chunks = Vec::new();
        for block in blocks {
            chunks.extend(self.build(block)?);
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationSegmenter;
    use chrono::{Duration, NaiveDate};

    fn block_of(lines: Vec<String>) -> ConversationBlock {
        let min = lines.len();
        let mut blocks = ConversationSegmenter::new(min, 30).segment(&lines);
        assert_eq!(blocks.len(), 1);
        blocks.remove(0)
    }

    fn chat_lines(count: usize, padding: usize) -> Vec<String> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        (0..count)
            .map(|i| {
                let ts = start + Duration::seconds(30 * i as i64);
                format!(
                    "[{}] Member{}: {}",
                    ts.format("%Y-%m-%d %H:%M:%S"),
                    i % 3,
                    "ha".repeat(padding)
                )
            })
            .collect()
    }

    struct FixedSplitter(Vec<&'static str>);

    impl TextSplit for FixedSplitter {
        fn split(&self, _text: &str) -> Result<Vec<String>, ChunkingError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FailingSplitter;

    impl TextSplit for FailingSplitter {
        fn split(&self, _text: &str) -> Result<Vec<String>, ChunkingError> {
            Err(ChunkingError::NoTokenizerFound)
        }
    }

    #[test]
    fn test_small_block_is_one_chunk() {
        let lines = chat_lines(10, 5);
        let block = block_of(lines.clone());
        let chunks = ChunkMetadataBuilder::with_defaults()
            .unwrap()
            .build(&block)
            .unwrap();

        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.text, lines.join("\n"));
        assert_eq!(chunk.metadata.chunk_type, "conversation");
        assert_eq!(chunk.metadata.message_count, 10);
        assert_eq!(chunk.metadata.length, chunk.text.chars().count());
        assert_eq!(chunk.metadata.start_time, "2024-06-01 20:00:00");
        assert_eq!(chunk.metadata.end_time, "2024-06-01 20:04:30");
    }

    #[test]
    fn test_large_block_spans_are_ordered_and_repeatable() {
        let block = block_of(chat_lines(120, 40));
        let builder = ChunkMetadataBuilder::with_defaults().unwrap();
        let chunks = builder.build(&block).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.metadata.length <= 2000);
            assert_ne!(chunk.metadata.start_time, "unknown");
            assert!(chunk.metadata.start_time <= chunk.metadata.end_time);
        }
        for pair in chunks.windows(2) {
            // consecutive chunks share their boundary line
            assert_eq!(pair[0].metadata.end_time, pair[1].metadata.start_time);
        }
        assert_eq!(chunks, builder.build(&block).unwrap());
    }

    #[test]
    fn test_unparsable_edges_are_unknown() {
        let block = block_of(chat_lines(3, 1));
        let builder = ChunkMetadataBuilder::new(FixedSplitter(vec![
            "continued text\n[2024-06-01 20:00:30] Member1: ha",
            "[2024-06-01 20:01:00] Member2: ha",
            "[unknown] Member0: ha",
        ]));
        let chunks = builder.build(&block).unwrap();

        assert_eq!(chunks[0].metadata.start_time, "unknown");
        assert_eq!(chunks[0].metadata.end_time, "2024-06-01 20:00:30");
        assert_eq!(chunks[0].metadata.message_count, 2);
        assert_eq!(chunks[1].metadata.start_time, chunks[1].metadata.end_time);
        assert_eq!(chunks[2].metadata.start_time, "unknown");
        assert_eq!(chunks[2].metadata.end_time, "unknown");
    }

    #[test]
    fn test_splitter_failure_propagates() {
        let block = block_of(chat_lines(3, 1));
        let result = ChunkMetadataBuilder::new(FailingSplitter).build(&block);
        assert!(matches!(result, Err(ChunkingError::NoTokenizerFound)));
    }

    #[test]
    fn test_length_counts_characters() {
        let block = block_of(vec![
            "[2024-06-01 20:00:00] נועה: מה קורה".to_string(),
        ]);
        let chunks = ChunkMetadataBuilder::with_defaults()
            .unwrap()
            .build(&block)
            .unwrap();
        assert_eq!(chunks[0].metadata.length, 35);
    }
}
