mod metadata;
pub mod splitter;

pub use metadata::{Chunk, ChunkMetadata, ChunkMetadataBuilder, CONVERSATION_CHUNK_TYPE};
pub use splitter::{
    ChunkingError, RecursiveChunkLengthFunction, RecursiveChunkingCharacters, TextSplit,
    TextSplitter,
};
