//! Overlapping token-window chunking.
//!
//! ```text
//! tokens:  0 ......................................................... n
//!          [ chunk 1 (chunk_size) ]
//!                       [ chunk 2 (chunk_size) ]
//!                       ← overlap →          [ chunk 3 (rest) ]
//! ```
//!
//! Windows advance by `chunk_size - overlap` tokens. Each chunk is a slice of
//! the original text, so consecutive chunks share exactly `overlap` tokens.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::accountant::TokenAccountant;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("Chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Splits long text into overlapping token-bounded chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    accountant: Arc<TokenAccountant>,
}

impl TextChunker {
    pub fn new(accountant: Arc<TokenAccountant>) -> Self {
        Self { accountant }
    }

    /// Checks a `(chunk_size, overlap)` pair without chunking anything.
    pub fn validate(chunk_size: usize, overlap: usize) -> Result<(), ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(())
    }

    /// Splits `text` into windows of `chunk_size` tokens advancing by
    /// `chunk_size - overlap`. Text that already fits is returned as a single chunk.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError`] if `chunk_size` is zero or `overlap >= chunk_size`.
    pub fn chunk_text(
        &self,
        text: &str,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<Vec<String>, ChunkError> {
        Self::validate(chunk_size, overlap)?;

        let spans = self.accountant.token_spans(text);
        if spans.len() <= chunk_size {
            return Ok(vec![text.to_string()]);
        }

        let step = chunk_size - overlap;
        let mut chunks = Vec::with_capacity(spans.len() / step + 1);
        let mut start = 0;
        loop {
            let end = (start + chunk_size).min(spans.len());
            let from = spans[start].start;
            let to = spans[end - 1].end;
            chunks.push(text.get(from..to).unwrap_or_default().to_string());
            if end == spans.len() {
                break;
            }
            start += step;
        }

        debug!(
            total_tokens = spans.len(),
            chunk_size,
            overlap,
            chunks = chunks.len(),
            "Split text into token chunks"
        );
        Ok(chunks)
    }
}
