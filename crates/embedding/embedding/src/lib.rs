//! # Text Embeddings
//!
//! This crate defines the embedding provider interface shared by the OpenAI and
//! local backends, the provider error taxonomy, and backend selection config.

use async_trait::async_trait;

mod config;
mod error;

pub use config::{EmbeddingBackend, EmbeddingConfig, EnvEmbeddingConfig, DEFAULT_BACKEND_URL};
pub use error::ProviderError;

/// Service for generating text embeddings.
///
/// Implementations classify failures into [`ProviderError`] variants at the
/// HTTP boundary, so callers can branch on the variant instead of parsing
/// error messages.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embedding model name sent with every request.
    fn model(&self) -> &str;

    /// Generates an embedding vector for a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}
