pub mod chunking;
pub mod config;
pub mod conversation;
pub mod meme;
pub mod pipeline;
pub mod transcript;

pub use config::{ConfigError, Settings};
pub use pipeline::{IngestError, Ingested, Ingestor, DEFAULT_BATCH_SIZE};
