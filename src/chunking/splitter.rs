use crate::config::ChunkingConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// A list of strings that can be used to recursively split text into chunks.
/// These are ordered from most to least preferred.
const RECURSIVE_ASCII_ONLY_CHUNK_SPLIT_STRINGS: &[&str] = &[
    "\n\n", // Double newline (paragraph break)
    "\n",   // Single newline
    ".",    // End of sentence
    ",",    // Comma
    ";",    // Semicolon
    ":",    // Colon
    " ",    // Space
    "-",    // Hyphen
    "",     // Empty string (character by character if needed)
];

const RECURSIVE_UNICODE_CHUNK_SPLIT_STRINGS: &[&str] = &[
    "\n\n",     // Double newline (paragraph break)
    "\n",       // Single newline
    ".",        // End of sentence
    ",",        // Comma
    "\u{200b}", // Zero-width space
    "\u{ff0c}", // Fullwidth comma
    "\u{3001}", // Ideographic comma
    "\u{ff0e}", // Fullwidth full stop
    "\u{3002}", // Ideographic full stop
    ";",        // Semicolon
    ":",        // Colon
    " ",        // Space
    "-",        // Hyphen
    "",         // Empty string (character by character if needed)
];

#[derive(Debug, Clone, PartialEq)]
pub enum RecursiveChunkingCharacters {
    Ascii,
    Unicode,
    Custom(Vec<String>),
}

#[derive(Debug, Error)]
pub enum ChunkingError {
    #[error("Invalid chunking characters!")]
    InvalidChunkingCharacters,
    #[error("Invalid chunk length function!")]
    InvalidChunkLengthFunction,
    #[error("Must instantiate with custom characters")]
    CustomCharactersRequired,
    #[error("Chunk overlap cannot be larger than chunk size!")]
    ChunkOverlapTooLarge,
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),
    #[error("No tokenizer found")]
    NoTokenizerFound,
}

impl std::str::FromStr for RecursiveChunkingCharacters {
    type Err = ChunkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ASCII" => RecursiveChunkingCharacters::Ascii,
            "UNICODE" => RecursiveChunkingCharacters::Unicode,
            "CUSTOM" => return Err(ChunkingError::CustomCharactersRequired),
            _ => return Err(ChunkingError::InvalidChunkingCharacters),
        })
    }
}

/// How chunk budgets are measured. `CharacterCount`, the default, counts
/// Unicode scalar values, so a budget of 2000 holds as many Hebrew letters
/// as Latin ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecursiveChunkLengthFunction {
    #[serde(rename = "CHARACTER")]
    CharacterCount,
    #[serde(rename = "WORD")]
    WordCount,
    #[serde(rename = "TOKEN")]
    TokenCount,
}

impl std::str::FromStr for RecursiveChunkLengthFunction {
    type Err = ChunkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "CHARACTER" => RecursiveChunkLengthFunction::CharacterCount,
            "WORD" => RecursiveChunkLengthFunction::WordCount,
            "TOKEN" => RecursiveChunkLengthFunction::TokenCount,
            _ => return Err(ChunkingError::InvalidChunkLengthFunction),
        })
    }
}

/// Text-splitting capability: turns one text into ordered, size-bounded pieces.
pub trait TextSplit {
    fn split(&self, text: &str) -> Result<Vec<String>, ChunkingError>;
}

pub struct TextSplitter {
    chunking_characters: RecursiveChunkingCharacters,
    chunk_length_function: RecursiveChunkLengthFunction,
    chunk_size: usize,
    chunk_overlap: usize,
    tokenizer: Option<CoreBPE>,
}

impl TextSplitter {
    pub fn new(
        chunking_characters: RecursiveChunkingCharacters,
        chunk_length_function: RecursiveChunkLengthFunction,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, ChunkingError> {
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::ChunkOverlapTooLarge);
        }
        let tokenizer = match chunk_length_function {
            RecursiveChunkLengthFunction::TokenCount => Some(
                tiktoken_rs::cl100k_base()
                    .map_err(|e| ChunkingError::TokenizerError(e.to_string()))?,
            ),
            _ => None,
        };
        Ok(Self {
            chunking_characters,
            chunk_length_function,
            chunk_size,
            chunk_overlap,
            tokenizer,
        })
    }

    /// Builds a splitter using the configured custom separator hierarchy.
    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ChunkingError> {
        if config.separators.is_empty() {
            return Err(ChunkingError::CustomCharactersRequired);
        }
        Self::new(
            RecursiveChunkingCharacters::Custom(config.separators.clone()),
            config.length_function,
            config.chunk_size,
            config.chunk_overlap,
        )
    }

    /// Splits text into chunks of at most `chunk_size`, trimmed, with blank
    /// chunks removed. A single piece longer than the budget that no finer
    /// separator can break is returned whole.
    pub fn recursively_chunk_text(&self, text: &str) -> Result<Vec<String>, ChunkingError> {
        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Ok(vec![]);
        }

        let separators = match &self.chunking_characters {
            RecursiveChunkingCharacters::Ascii => RECURSIVE_ASCII_ONLY_CHUNK_SPLIT_STRINGS.to_vec(),
            RecursiveChunkingCharacters::Unicode => RECURSIVE_UNICODE_CHUNK_SPLIT_STRINGS.to_vec(),
            RecursiveChunkingCharacters::Custom(chars) => {
                chars.iter().map(|s| s.as_str()).collect()
            }
        };

        let mut result = self.split_text_recursive(trimmed_text, &separators)?;
        result.retain(|chunk| !chunk.trim().is_empty());
        result.iter_mut().for_each(|chunk| {
            *chunk = chunk.trim().to_string();
        });

        Ok(result)
    }

    /// Splits `text` on the most preferred separator it contains and packs
    /// the pieces. A piece still over budget recurses with the finer
    /// separators, or is kept whole when none are left.
    fn split_text_recursive(
        &self,
        text: &str,
        separators: &[&str],
    ) -> Result<Vec<String>, ChunkingError> {
        let Some((separator, finer)) = pick_separator(text, separators) else {
            return Ok(vec![text.to_string()]);
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<(&str, usize)> = Vec::new();
        for piece in split_on(text, separator) {
            if piece.is_empty() {
                continue;
            }
            let length = self.chunk_length(piece)?;
            if length < self.chunk_size {
                pending.push((piece, length));
                continue;
            }

            chunks.extend(self.merge_splits(&pending, separator)?);
            pending.clear();
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_text_recursive(piece, finer)?);
            }
        }
        chunks.extend(self.merge_splits(&pending, separator)?);

        Ok(chunks)
    }

    /// Greedily packs under-budget pieces into chunks. When a chunk closes,
    /// leading pieces are dropped until the remainder fits in `chunk_overlap`
    /// and leaves room for the incoming piece; the remainder opens the next
    /// chunk. Greedy, so the overlap may come out smaller than allowed.
    fn merge_splits(
        &self,
        pieces: &[(&str, usize)],
        separator: &str,
    ) -> Result<Vec<String>, ChunkingError> {
        let separator_len = if separator.is_empty() {
            0
        } else {
            self.chunk_length(separator)?
        };
        let mut merged = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut window_len = 0;

        for &(piece, length) in pieces {
            let joint = if window.is_empty() { 0 } else { separator_len };
            if !window.is_empty() && window_len + joint + length > self.chunk_size {
                merged.extend(join_window(&window, separator));
                while window_len > self.chunk_overlap
                    || (window_len > 0 && window_len + joint + length > self.chunk_size)
                {
                    let Some((_, dropped)) = window.pop_front() else {
                        break;
                    };
                    window_len -= dropped + if window.is_empty() { 0 } else { separator_len };
                }
            }

            window_len += length + if window.is_empty() { 0 } else { separator_len };
            window.push_back((piece, length));
        }
        merged.extend(join_window(&window, separator));

        Ok(merged)
    }

    pub fn chunk_length(&self, chunk: &str) -> Result<usize, ChunkingError> {
        match self.chunk_length_function {
            RecursiveChunkLengthFunction::CharacterCount => Ok(chunk.chars().count()),
            RecursiveChunkLengthFunction::WordCount => Ok(chunk.split_whitespace().count()),
            RecursiveChunkLengthFunction::TokenCount => match &self.tokenizer {
                Some(tokenizer) => Ok(tokenizer.encode_ordinary(chunk).len()),
                None => Err(ChunkingError::NoTokenizerFound),
            },
        }
    }
}

impl TextSplit for TextSplitter {
    fn split(&self, text: &str) -> Result<Vec<String>, ChunkingError> {
        self.recursively_chunk_text(text)
    }
}

/// First separator present in `text`, with the finer ones after it. The empty
/// separator always matches and ends the hierarchy. When nothing matches the
/// first separator is used with nothing finer.
fn pick_separator<'s, 'a>(
    text: &str,
    separators: &'s [&'a str],
) -> Option<(&'a str, &'s [&'a str])> {
    let first = *separators.first()?;
    for (i, &separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return Some((separator, &[]));
        }
        if text.contains(separator) {
            return Some((separator, &separators[i + 1..]));
        }
    }
    Some((first, &[]))
}

/// Pieces of `text` between separators; the empty separator yields one
/// piece per char.
fn split_on<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split(separator).collect()
    }
}

fn join_window(window: &VecDeque<(&str, usize)>, separator: &str) -> Option<String> {
    let joined = window
        .iter()
        .map(|(piece, _)| *piece)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
