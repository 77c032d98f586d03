//! Shared test utilities for memory integration tests.
//!
//! Provides embedding services (scripted, bag-of-words, limit-enforcing) and
//! store wrappers used by the test files under tests/.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use embedding::{EmbeddingService, ProviderError};
use memory::{EmbeddingClient, EmbeddingClientOptions, MemoryOptions, OversizePolicy, SituationMemory};
use memory_core::{DistanceMetric, Neighbor, StoreError, StoredSituation, VectorStore};
use memory_inmemory::InMemoryVectorStore;
use tokens::TokenAccountant;

pub const DIM: usize = 256;

/// Small limits so tests can build over-limit text cheaply (4 chars per token).
pub fn small_options() -> EmbeddingClientOptions {
    EmbeddingClientOptions {
        token_limit: 100,
        safety_margin: 10,
        chunk_size: 40,
        chunk_overlap: 5,
    }
}

pub fn accountant() -> Arc<TokenAccountant> {
    Arc::new(TokenAccountant::default())
}

/// Text of exactly `tokens` tokens under the default 4-chars-per-token estimate.
pub fn text_of_tokens(tokens: usize) -> String {
    "abcd".repeat(tokens)
}

/// Deterministic bag-of-words embedding: each lowercase word is hashed into one
/// of `DIM` buckets, then the vector is normalized.
pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIM];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hasher = DefaultHasher::new();
        word.to_lowercase().hash(&mut hasher);
        vector[(hasher.finish() as usize) % DIM] += 1.0;
    }
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    } else {
        vector[0] = 1.0;
    }
    vector
}

/// Embedding service with a scripted sequence of replies; records every input.
pub struct ScriptedEmbedding {
    replies: Mutex<VecDeque<Result<Vec<f32>, ProviderError>>>,
    inputs: Mutex<Vec<String>>,
}

impl ScriptedEmbedding {
    pub fn new(replies: Vec<Result<Vec<f32>, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

#[async_trait]
impl EmbeddingService for ScriptedEmbedding {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.inputs.lock().unwrap().push(text.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::InvalidResponse("script exhausted".to_string())))
    }
}

/// Bag-of-words provider that behaves like a real model: rejects input over
/// `max_tokens` with a context-length error and fails any text containing `fail_marker`.
pub struct BagOfWordsEmbedding {
    accountant: Arc<TokenAccountant>,
    max_tokens: usize,
    fail_marker: Option<String>,
    inputs: Mutex<Vec<String>>,
}

impl BagOfWordsEmbedding {
    pub fn new(max_tokens: usize) -> Arc<Self> {
        Arc::new(Self {
            accountant: accountant(),
            max_tokens,
            fail_marker: None,
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_on(max_tokens: usize, marker: &str) -> Arc<Self> {
        Arc::new(Self {
            accountant: accountant(),
            max_tokens,
            fail_marker: Some(marker.to_string()),
            inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingService for BagOfWordsEmbedding {
    fn model(&self) -> &str {
        "bag-of-words"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.inputs.lock().unwrap().push(text.to_string());
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(ProviderError::Network("connection reset".to_string()));
            }
        }
        let tokens = self.accountant.count_tokens(text);
        if tokens > self.max_tokens {
            return Err(ProviderError::ContextLengthExceeded(format!(
                "This model's maximum context length is {} tokens, however you requested {} tokens",
                self.max_tokens, tokens
            )));
        }
        Ok(bag_of_words(text))
    }
}

/// Store wrapper that counts `add` calls.
pub struct RecordingStore {
    inner: InMemoryVectorStore,
    add_calls: Mutex<usize>,
}

impl RecordingStore {
    pub fn new(name: &str, metric: DistanceMetric) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryVectorStore::with_metric(name, metric),
            add_calls: Mutex::new(0),
        })
    }

    pub fn add_calls(&self) -> usize {
        *self.add_calls.lock().unwrap()
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn metric(&self) -> DistanceMetric {
        self.inner.metric()
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }

    async fn add(&self, records: Vec<StoredSituation>) -> Result<(), StoreError> {
        *self.add_calls.lock().unwrap() += 1;
        self.inner.add(records).await
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<Neighbor>, StoreError> {
        self.inner.query(embedding, k).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear().await
    }
}

/// Store whose every call fails, as if the backend were unreachable.
pub struct UnreachableStore;

#[async_trait]
impl VectorStore for UnreachableStore {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Err(StoreError::Backend("database is locked".to_string()))
    }

    async fn add(&self, _records: Vec<StoredSituation>) -> Result<(), StoreError> {
        Err(StoreError::Backend("database is locked".to_string()))
    }

    async fn query(&self, _embedding: &[f32], _k: usize) -> Result<Vec<Neighbor>, StoreError> {
        Err(StoreError::Backend("database is locked".to_string()))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend("database is locked".to_string()))
    }
}

pub fn client(service: Arc<dyn EmbeddingService>, options: EmbeddingClientOptions) -> EmbeddingClient {
    EmbeddingClient::new(service, accountant(), options).unwrap()
}

/// Memory over `service` and `store` with small limits (token limit 100, fallback margin 30).
pub fn memory(
    service: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
    policy: OversizePolicy,
) -> SituationMemory {
    let accountant = accountant();
    let client = EmbeddingClient::new(service, accountant.clone(), small_options()).unwrap();
    SituationMemory::new(
        store.name().to_string(),
        client,
        accountant,
        store,
        MemoryOptions {
            fallback_margin: 30,
            oversize_policy: policy,
        },
    )
}
