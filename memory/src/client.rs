//! # Embedding Client
//!
//! Turns text into a vector through an [`EmbeddingService`] without ever sending
//! the provider more than `token_limit` tokens.
//!
//! ```text
//! count tokens
//!   ├─ > limit ──► fit to limit (marker included) ──► one call, no retry
//!   └─ ≤ limit ──► call
//!                   ├─ Success
//!                   ├─ Fatal ──────────────────────► error
//!                   └─ Retryable (context length) ─► fit to limit - safety_margin ──► one more call
//! ```
//!
//! Calls are made one at a time, in order.

use std::sync::Arc;

use embedding::EmbeddingService;
use tokens::{TextChunker, TokenAccountant, TRUNCATION_MARKER};
use tracing::{debug, info, warn};

use crate::attempt::EmbeddingAttempt;
use crate::config::{check_marker_budget, ConfigError, MemoryConfig};
use crate::error::EmbeddingError;

/// Token budget settings for [`EmbeddingClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingClientOptions {
    pub token_limit: usize,
    pub safety_margin: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for EmbeddingClientOptions {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

impl From<&MemoryConfig> for EmbeddingClientOptions {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            token_limit: config.token_limit,
            safety_margin: config.safety_margin,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

/// An embedding together with the exact text that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedText {
    pub embedding: Vec<f32>,
    /// Text sent to the provider (original, or truncated with the marker).
    pub text: String,
    /// Token count of `text`.
    pub tokens: usize,
    pub truncated: bool,
}

/// Token-aware wrapper over an embedding provider.
#[derive(Clone)]
pub struct EmbeddingClient {
    service: Arc<dyn EmbeddingService>,
    accountant: Arc<TokenAccountant>,
    chunker: TextChunker,
    options: EmbeddingClientOptions,
}

impl EmbeddingClient {
    /// Creates a client. Chunking and margins are checked here so that a bad
    /// configuration fails before the first provider call.
    pub fn new(
        service: Arc<dyn EmbeddingService>,
        accountant: Arc<TokenAccountant>,
        options: EmbeddingClientOptions,
    ) -> Result<Self, ConfigError> {
        if options.token_limit == 0 {
            return Err(ConfigError::ZeroTokenLimit);
        }
        if options.safety_margin >= options.token_limit {
            return Err(ConfigError::MarginTooLarge {
                name: "safety_margin",
                margin: options.safety_margin,
                token_limit: options.token_limit,
            });
        }
        check_marker_budget(&accountant, "safety_margin", options.token_limit - options.safety_margin)?;
        TextChunker::validate(options.chunk_size, options.chunk_overlap)?;
        if options.chunk_size > options.token_limit {
            return Err(ConfigError::ChunkLargerThanLimit {
                chunk_size: options.chunk_size,
                token_limit: options.token_limit,
            });
        }

        Ok(Self {
            service,
            chunker: TextChunker::new(accountant.clone()),
            accountant,
            options,
        })
    }

    pub fn accountant(&self) -> &Arc<TokenAccountant> {
        &self.accountant
    }

    pub fn options(&self) -> &EmbeddingClientOptions {
        &self.options
    }

    pub fn token_limit(&self) -> usize {
        self.options.token_limit
    }

    /// Model name of the underlying provider.
    pub fn model(&self) -> &str {
        self.service.model()
    }

    async fn attempt(&self, text: &str, tokens: usize) -> EmbeddingAttempt {
        debug!(model = %self.service.model(), tokens, "Embedding attempt");
        EmbeddingAttempt::from_provider(self.service.embed(text).await, tokens)
    }

    /// Embeds `text`, truncating when it is over the limit or when the provider
    /// rejects it as too long. Returns the embedding and the text actually embedded.
    ///
    /// # Errors
    ///
    /// - `ContextLengthExceeded` if the provider still rejects the truncated text
    /// - `Provider` for any other provider failure (never retried)
    pub async fn embed_text(&self, text: &str) -> Result<EmbeddedText, EmbeddingError> {
        let limit = self.options.token_limit;
        let tokens = self.accountant.count_tokens(text);

        if tokens > limit {
            let fitted = self.accountant.fit_to_budget(text, limit);
            let fitted_tokens = self.accountant.count_tokens(&fitted);
            warn!(
                original_tokens = tokens,
                truncated_tokens = fitted_tokens,
                token_limit = limit,
                marker = TRUNCATION_MARKER,
                "Text over token limit, truncating before embedding"
            );
            let embedding = self.attempt(&fitted, fitted_tokens).await.into_final()?;
            return Ok(EmbeddedText {
                embedding,
                text: fitted,
                tokens: fitted_tokens,
                truncated: true,
            });
        }

        match self.attempt(text, tokens).await {
            EmbeddingAttempt::Success(embedding) => Ok(EmbeddedText {
                embedding,
                text: text.to_string(),
                tokens,
                truncated: false,
            }),
            EmbeddingAttempt::Fatal(e) => {
                warn!(tokens, error = %e, "Embedding failed");
                Err(e)
            }
            EmbeddingAttempt::Retryable(reason) => {
                let budget = limit - self.options.safety_margin;
                let fitted = self.accountant.fit_to_budget(text, budget);
                let fitted_tokens = self.accountant.count_tokens(&fitted);
                warn!(
                    reason = ?reason,
                    original_tokens = tokens,
                    truncated_tokens = fitted_tokens,
                    budget,
                    marker = TRUNCATION_MARKER,
                    "Provider rejected input length, retrying once with truncated text"
                );
                let embedding = self.attempt(&fitted, fitted_tokens).await.into_final()?;
                let truncated = fitted != text;
                Ok(EmbeddedText {
                    embedding,
                    text: fitted,
                    tokens: fitted_tokens,
                    truncated,
                })
            }
        }
    }

    /// Embeds `text` with at most one truncate-and-retry.
    pub async fn get_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_text(text).await.map(|embedded| embedded.embedding)
    }

    /// Embeds `text` chunk by chunk and returns the element-wise mean.
    ///
    /// Failed chunks and chunks whose dimension differs from the first
    /// successful one are skipped (logged).
    ///
    /// # Errors
    ///
    /// `AllChunksFailed` when no chunk could be embedded.
    pub async fn get_embedding_chunked(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let chunks = self
            .chunker
            .chunk_text(text, self.options.chunk_size, self.options.chunk_overlap)?;

        let mut sum: Vec<f32> = Vec::new();
        let mut used = 0usize;
        for (index, chunk) in chunks.iter().enumerate() {
            let embedding = match self.get_embedding(chunk).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    warn!(chunk = index, chunks = chunks.len(), error = %e, "Chunk failed to embed, skipping");
                    continue;
                }
            };

            if used == 0 {
                sum = embedding;
            } else if embedding.len() != sum.len() {
                warn!(
                    chunk = index,
                    expected = sum.len(),
                    actual = embedding.len(),
                    "Chunk embedding dimension differs, skipping"
                );
                continue;
            } else {
                for (acc, value) in sum.iter_mut().zip(embedding.iter()) {
                    *acc += value;
                }
            }
            used += 1;
        }

        if used == 0 {
            warn!(chunks = chunks.len(), "All chunks failed to embed");
            return Err(EmbeddingError::AllChunksFailed { chunks: chunks.len() });
        }

        let divisor = used as f32;
        for value in sum.iter_mut() {
            *value /= divisor;
        }

        info!(
            chunks = chunks.len(),
            used,
            dimension = sum.len(),
            "step: chunk-averaged embedding done"
        );
        Ok(sum)
    }
}
