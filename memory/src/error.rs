//! Error types for the embedding client and the situation memory.

use embedding::ProviderError;
use memory_core::StoreError;
use thiserror::Error;
use tokens::ChunkError;

use crate::config::ConfigError;

/// Failure to turn text into an embedding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// The provider rejected the input as too long, after local truncation was applied.
    #[error("Input of {tokens} tokens exceeds the provider context window: {message}")]
    ContextLengthExceeded { tokens: usize, message: String },

    #[error("Embedding provider error: {0}")]
    Provider(ProviderError),

    /// Every chunk on the chunk-average path failed.
    #[error("All {chunks} chunks failed to embed")]
    AllChunksFailed { chunks: usize },

    #[error("Chunking failed: {0}")]
    Chunking(#[from] ChunkError),
}

/// Error returned by [`crate::SituationMemory`].
#[derive(Error, Debug)]
pub enum MemoryError {
    /// The query text could not be embedded; there is no partial result for a query.
    #[error("Failed to embed query: {0}")]
    QueryEmbedding(#[source] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
