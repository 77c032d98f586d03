//! Builds the collaborators of a [`crate::SituationMemory`] from configuration.

use std::sync::Arc;

use embedding::{EmbeddingBackend, EmbeddingConfig, EmbeddingService, EnvEmbeddingConfig};
use local_embedding::LocalEmbedding;
use memory_core::{DistanceMetric, VectorStore};
use memory_inmemory::InMemoryVectorStore;
use memory_sqlite::SQLiteVectorStore;
use openai_embedding::OpenAIEmbedding;
use tokens::{CharEstimateTokenizer, TokenAccountant};
use tracing::info;

use crate::config::{ConfigError, MemoryConfig, StoreConfig};
use crate::error::MemoryError;

/// Creates the embedding provider selected by the backend URL: loopback hosts
/// get [`LocalEmbedding`], everything else [`OpenAIEmbedding`].
pub fn create_embedding_service(
    config: &EnvEmbeddingConfig,
) -> Result<Arc<dyn EmbeddingService>, ConfigError> {
    let model = config.resolved_model();
    let backend = config.backend();
    info!(backend = ?backend, backend_url = %config.backend_url(), model = %model, "Creating embedding service");

    match backend {
        EmbeddingBackend::Local => {
            let service = LocalEmbedding::new(config.backend_url(), &model)
                .map_err(|e| ConfigError::Embedding(e.to_string()))?
                .with_api_key(config.api_key());
            Ok(Arc::new(service))
        }
        EmbeddingBackend::Cloud => Ok(Arc::new(OpenAIEmbedding::new_with_base_url(
            config.api_key().to_string(),
            model,
            Some(config.backend_url()),
        ))),
    }
}

/// Creates the token accountant: a Hugging Face tokenizer when a tokenizer
/// file is configured, the character estimate otherwise.
pub fn create_accountant(config: &MemoryConfig) -> Result<Arc<TokenAccountant>, ConfigError> {
    match &config.tokenizer_file {
        Some(path) => load_tokenizer_file(path),
        None => Ok(Arc::new(TokenAccountant::new(Arc::new(CharEstimateTokenizer::new(
            config.chars_per_token,
        ))))),
    }
}

#[cfg(feature = "huggingface")]
fn load_tokenizer_file(path: &str) -> Result<Arc<TokenAccountant>, ConfigError> {
    let tokenizer =
        tokens::HuggingFaceTokenizer::from_file(path).map_err(|e| ConfigError::Tokenizer(e.to_string()))?;
    Ok(Arc::new(TokenAccountant::new(Arc::new(tokenizer))))
}

#[cfg(not(feature = "huggingface"))]
fn load_tokenizer_file(path: &str) -> Result<Arc<TokenAccountant>, ConfigError> {
    Err(ConfigError::Tokenizer(format!(
        "{path} requires the `huggingface` feature"
    )))
}

/// Opens the store for collection `name`.
pub async fn create_store(
    name: &str,
    config: &StoreConfig,
    metric: DistanceMetric,
) -> Result<Arc<dyn VectorStore>, MemoryError> {
    match config {
        StoreConfig::InMemory => Ok(Arc::new(InMemoryVectorStore::with_metric(name, metric))),
        StoreConfig::Sqlite { path } => {
            let store = SQLiteVectorStore::open_with_metric(path, name, metric).await?;
            Ok(Arc::new(store))
        }
    }
}
