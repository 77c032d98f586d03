//! # Local Embedding Service
//!
//! This crate provides an implementation of the `EmbeddingService` trait for embedding models
//! served on the local machine (Ollama, llama.cpp server, LM Studio, text-embeddings-inference).
//!
//! ## LocalEmbedding
//!
//! Sends `POST {base_url}/embeddings` with `{"model": ..., "input": ...}`.
//!
//! **Accepted reply shapes**:
//! - OpenAI-compatible: `{"data": [{"embedding": [...]}]}`
//! - Single vector: `{"embedding": [...]}`
//! - Vector list: `{"embeddings": [[...]]}`
//!
//! **Considerations**:
//! - No API key required (an optional bearer token is sent when configured)
//! - Context window depends on how the model was loaded; over-long inputs are
//!   reported as `ProviderError::ContextLengthExceeded`
//!
//! ## Example
//!
//! ```rust,no_run
//! use local_embedding::LocalEmbedding;
//! use embedding::EmbeddingService;
//!
//! async fn example() -> Result<(), embedding::ProviderError> {
//!     let service = LocalEmbedding::new("http://localhost:11434/v1", "nomic-embed-text")?;
//!     let embedding = service.embed("Hello world").await?;
//!     println!("Embedding dimension: {}", embedding.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use embedding::{EmbeddingService, ProviderError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Default model for the local backend.
pub const DEFAULT_MODEL: &str = "nomic-embed-text";

const EMBED_TIMEOUT: Duration = Duration::from_secs(30);

const LOG_PREVIEW_LEN: usize = 200;

/// Local embedding service implementation.
#[derive(Debug, Clone)]
pub struct LocalEmbedding {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl LocalEmbedding {
    /// Creates a new local embedding service.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the local API (e.g. "http://localhost:11434/v1").
    /// * `model` - The embedding model to use (e.g. "nomic-embed-text").
    pub fn new(base_url: &str, model: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(base_url, model, EMBED_TIMEOUT)
    }

    /// Creates a new local embedding service with a custom request timeout.
    pub fn with_timeout(base_url: &str, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: None,
            model: model.to_string(),
            timeout,
        })
    }

    /// Sends `Authorization: Bearer <key>` with every request (for servers started with a key).
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string()).filter(|k| !k.trim().is_empty());
        self
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    OpenAi { data: Vec<EmbeddingData> },
    Single { embedding: Vec<f32> },
    Multi { embeddings: Vec<Vec<f32>> },
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_first(self) -> Option<Vec<f32>> {
        match self {
            EmbeddingResponse::OpenAi { data } => data.into_iter().next().map(|d| d.embedding),
            EmbeddingResponse::Single { embedding } => Some(embedding),
            EmbeddingResponse::Multi { embeddings } => embeddings.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        message: String,
        #[serde(default)]
        code: Option<serde_json::Value>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
    Plain(String),
}

/// Classifies a non-success reply using its status and JSON error body.
fn classify_error_reply(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody::Detailed { message, code, kind },
        }) => {
            let code = code.map(|c| match c {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });
            ProviderError::classify(Some(status), code.as_deref(), kind.as_deref(), &message)
        }
        Ok(ErrorEnvelope {
            error: ErrorBody::Plain(message),
        }) => ProviderError::classify(Some(status), None, None, &message),
        Err(_) => ProviderError::classify(Some(status), None, None, body),
    }
}

#[async_trait]
impl EmbeddingService for LocalEmbedding {
    fn model(&self) -> &str {
        &self.model
    }

    /// Generates an embedding vector for a single text string using the local server.
    ///
    /// # Errors
    ///
    /// - `ContextLengthExceeded` if the server rejects the input as too long
    /// - `Network` / `Timeout` if the server is unreachable or slow
    /// - `InvalidResponse` if the reply carries no embedding
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let text_preview: String = text.chars().take(LOG_PREVIEW_LEN).collect();
        info!(
            model = %self.model,
            endpoint = %self.endpoint,
            text_preview = %text_preview,
            text_len = text.len(),
            "step: embedding local embed request"
        );

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout.as_secs())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = classify_error_reply(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "Local embed request failed");
            return Err(err);
        }

        let parsed: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Unexpected reply: {e}")))?;
        let embedding = parsed
            .into_first()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("No embedding in response".to_string()))?;

        info!(dimension = embedding.len(), "step: embedding local embed done");
        Ok(embedding)
    }
}
