//! # OpenAI Embedding Service
//!
//! This crate provides an implementation of the `EmbeddingService` trait using OpenAI's embedding API
//! (or any hosted OpenAI-compatible endpoint).
//!
//! ## Example
//!
//! ```rust,no_run
//! use openai_embedding::OpenAIEmbedding;
//! use embedding::EmbeddingService;
//!
//! async fn example() -> Result<(), embedding::ProviderError> {
//!     let service = OpenAIEmbedding::new("sk-...".to_string(), "text-embedding-3-small".to_string());
//!     let embedding = service.embed("High inflation with rising rates").await?;
//!     println!("Embedding dimension: {}", embedding.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Models
//!
//! - `text-embedding-3-small`: 1536 dimensions, 8191 input tokens
//! - `text-embedding-3-large`: 3072 dimensions, 8191 input tokens
//! - `text-embedding-ada-002`: 1536 dimensions (legacy model)
//!
//! ## Errors
//!
//! API failures are mapped onto [`ProviderError`]: an over-long input becomes
//! `ContextLengthExceeded` (recoverable by truncation), everything else is
//! passed through as authentication / rate-limit / network / API errors.

use std::time::Duration;

use async_openai::{error::OpenAIError, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use embedding::{EmbeddingService, ProviderError};
use tracing::{debug, info, instrument, warn};

/// Default model for the cloud backend.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Default timeout for a single embed request (connect + request + response).
const EMBED_TIMEOUT: Duration = Duration::from_secs(30);

const LOG_PREVIEW_LEN: usize = 200;

/// OpenAI embedding service implementation. Holds the async-openai client and model name.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    client: Client<async_openai::config::OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAIEmbedding {
    /// Creates a new OpenAI embedding service.
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key. If empty, will try to read from OPENAI_API_KEY environment variable.
    /// * `model` - The embedding model to use (e.g., "text-embedding-3-small").
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_base_url(api_key, model, None)
    }

    /// Creates a new OpenAI embedding service with optional base URL (any OpenAI-compatible endpoint).
    ///
    /// When `base_url` is `Some`, requests are sent to that URL instead of the default OpenAI API.
    pub fn new_with_base_url(api_key: String, model: String, base_url: Option<&str>) -> Self {
        let api_key = if api_key.is_empty() {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            api_key
        };

        let mut openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url.filter(|s| !s.is_empty()) {
            openai_config = openai_config.with_api_base(url);
        }
        let client = Client::with_config(openai_config);

        Self {
            client,
            model,
            timeout: EMBED_TIMEOUT,
        }
    }

    /// Creates a new OpenAI embedding service with the default model.
    pub fn with_api_key(api_key: String) -> Self {
        Self::new(api_key, DEFAULT_MODEL.to_string())
    }

    /// Sets a different embedding model.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Maps an async-openai error onto the provider error taxonomy.
pub fn classify_openai_error(err: OpenAIError) -> ProviderError {
    match err {
        OpenAIError::ApiError(api) => {
            let code = api
                .code
                .as_ref()
                .map(|c| c.to_string().trim_matches('"').to_string());
            ProviderError::classify(None, code.as_deref(), api.r#type.as_deref(), &api.message)
        }
        OpenAIError::Reqwest(e) => match e.status() {
            Some(status) => ProviderError::classify(Some(status.as_u16()), None, None, &e.to_string()),
            None => ProviderError::Network(e.to_string()),
        },
        OpenAIError::JSONDeserialize(e) => ProviderError::InvalidResponse(e.to_string()),
        other => ProviderError::Api {
            status: None,
            message: other.to_string(),
        },
    }
}

fn preview(text: &str) -> String {
    if text.len() <= LOG_PREVIEW_LEN {
        return text.to_string();
    }
    let safe_len = text
        .char_indices()
        .nth(LOG_PREVIEW_LEN)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    format!("{}...", &text[..safe_len])
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    fn model(&self) -> &str {
        &self.model
    }

    /// Generates an embedding vector for a single text string using OpenAI's API.
    ///
    /// # Errors
    ///
    /// - `ContextLengthExceeded` if the model rejects the input as too long
    /// - `Authentication` / `RateLimited` / `Network` / `Api` for other failures
    /// - `Timeout` if no response arrives within the configured timeout
    /// - `InvalidResponse` if the response carries no embedding
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        info!(
            model = %self.model,
            text_preview = %preview(text),
            text_len = text.len(),
            "step: embedding OpenAI embed request"
        );

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(vec![text])
            .build()
            .map_err(classify_openai_error)?;

        let embeddings = self.client.embeddings();
        let response = match tokio::time::timeout(self.timeout, embeddings.create(request)).await {
            Ok(Ok(r)) => {
                debug!("OpenAI embed response received");
                r
            }
            Ok(Err(e)) => {
                let err = classify_openai_error(e);
                warn!(error = %err, "OpenAI embed request failed");
                return Err(err);
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "OpenAI embed request timed out"
                );
                return Err(ProviderError::Timeout(self.timeout.as_secs()));
            }
        };

        let embedding = match response.data.into_iter().next() {
            Some(item) => item.embedding,
            None => {
                warn!("OpenAI embed response has no embedding data");
                return Err(ProviderError::InvalidResponse(
                    "No embedding in response".to_string(),
                ));
            }
        };

        info!(dimension = embedding.len(), "step: embedding OpenAI embed done");
        Ok(embedding)
    }
}

// Unit/integration tests live in tests/openai_embedding_test.rs
