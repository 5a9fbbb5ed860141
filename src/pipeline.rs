//! Raw transcript text in, indexable chunks out.

use crate::chunking::{Chunk, ChunkMetadataBuilder, ChunkingError};
use crate::config::Settings;
use crate::conversation::{extract_senders, ConversationBlock, ConversationSegmenter};
use crate::transcript::{render_messages, Message, ParseError, ParserRegistry, WhatsAppParser};
use thiserror::Error;
use tracing::{info, instrument};

/// Chunks handed to the index store per call.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("no valid messages found in transcript")]
    NoMessages,
    #[error("no conversations of at least {min_size} messages among {messages} messages")]
    NoConversations { messages: usize, min_size: usize },
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
}

/// Everything one transcript produces.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub messages: Vec<Message>,
    pub senders: Vec<String>,
    pub blocks: Vec<ConversationBlock>,
    pub chunks: Vec<Chunk>,
}

impl Ingested {
    /// Chunks in consecutive groups of at most `batch_size`.
    pub fn batches(&self, batch_size: usize) -> std::slice::Chunks<'_, Chunk> {
        self.chunks.chunks(batch_size.max(1))
    }
}

pub struct Ingestor {
    registry: ParserRegistry,
    format: String,
    segmenter: ConversationSegmenter,
    chunker: ChunkMetadataBuilder,
}

impl Ingestor {
    pub fn new(settings: &Settings) -> Result<Self, IngestError> {
        Ok(Self {
            registry: ParserRegistry::default(),
            format: WhatsAppParser::FORMAT.to_string(),
            segmenter: ConversationSegmenter::from_config(&settings.segmentation),
            chunker: ChunkMetadataBuilder::from_config(&settings.chunking)?,
        })
    }

    /// Reads transcripts in another registered format.
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    #[instrument(skip_all, fields(format = %self.format, bytes = raw_text.len()))]
    pub fn ingest(&self, raw_text: &str) -> Result<Ingested, IngestError> {
        let messages = self.registry.parse(&self.format, raw_text)?;
        if messages.is_empty() {
            return Err(IngestError::NoMessages);
        }

        let lines = render_messages(&messages);
        let senders = extract_senders(&lines);
        let blocks = self.segmenter.segment(&lines);
        if blocks.is_empty() {
            return Err(IngestError::NoConversations {
                messages: messages.len(),
                min_size: self.segmenter.min_size(),
            });
        }

        let chunks = self.chunker.build_all(&blocks)?;
        info!(
            messages = messages.len(),
            senders = senders.len(),
            conversations = blocks.len(),
            chunks = chunks.len(),
            "ingested transcript"
        );

        Ok(Ingested {
            messages,
            senders,
            blocks,
            chunks,
        })
    }
}
