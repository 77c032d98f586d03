//! # In-Memory Vector Store
//!
//! This crate provides an in-memory implementation of the `VectorStore` trait from `memory-core`.
//!
//! ## InMemoryVectorStore
//!
//! Volatile storage for tests, development and short-lived runs.
//!
//! **Advantages**:
//! - No I/O
//! - Nothing to set up
//!
//! **Limitations**:
//! - Data is lost on restart
//! - Query is a linear scan
//!
//! ## Example
//!
//! ```rust
//! use memory_inmemory::InMemoryVectorStore;
//! use memory_core::{StoredSituation, VectorStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), memory_core::StoreError> {
//!     let store = InMemoryVectorStore::new("trader_memory");
//!     store
//!         .add(vec![StoredSituation::new("0", "High inflation", "Favor value stocks", vec![1.0, 0.0])])
//!         .await?;
//!
//!     let neighbors = store.query(&[1.0, 0.0], 1).await?;
//!     assert_eq!(neighbors[0].recommendation, "Favor value stocks");
//!     Ok(())
//! }
//! ```
//!
//! ## Thread Safety
//!
//! The store uses `Arc<RwLock<>>`; clones share the same collection.

use std::sync::Arc;

use memory_core::{
    check_batch_dimension, check_query_dimension, rank_neighbors, DistanceMetric, Neighbor, StoreError,
    StoredSituation, VectorStore,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct Collection {
    records: Vec<StoredSituation>,
    dimension: Option<usize>,
}

/// In-memory vector store.
#[derive(Debug, Clone)]
pub struct InMemoryVectorStore {
    name: String,
    metric: DistanceMetric,
    collection: Arc<RwLock<Collection>>,
}

impl InMemoryVectorStore {
    /// Creates a new empty store using cosine distance.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_metric(name, DistanceMetric::Cosine)
    }

    pub fn with_metric(name: impl Into<String>, metric: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            metric,
            collection: Arc::new(RwLock::new(Collection::default())),
        }
    }

    /// Embedding dimension of the collection, once the first record is stored.
    pub async fn dimension(&self) -> Option<usize> {
        self.collection.read().await.dimension
    }
}

#[async_trait::async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.collection.read().await.records.len())
    }

    async fn add(&self, records: Vec<StoredSituation>) -> Result<(), StoreError> {
        let mut collection = self.collection.write().await;
        let dimension = match check_batch_dimension(collection.dimension, &records) {
            Ok(dimension) => dimension,
            Err(e) => {
                warn!(collection = %self.name, error = %e, "In-memory store rejected batch");
                return Err(e);
            }
        };

        let added = records.len();
        collection.dimension = dimension;
        collection.records.extend(records);

        info!(
            collection = %self.name,
            added,
            total = collection.records.len(),
            dimension = ?collection.dimension,
            "step: in-memory store add"
        );
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<Neighbor>, StoreError> {
        let collection = self.collection.read().await;
        check_query_dimension(collection.dimension, embedding)?;

        let neighbors = rank_neighbors(self.metric, embedding, &collection.records, k);
        info!(
            collection = %self.name,
            k,
            count = neighbors.len(),
            "step: in-memory store query"
        );
        Ok(neighbors)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut collection = self.collection.write().await;
        let removed = collection.records.len();
        *collection = Collection::default();
        info!(collection = %self.name, removed, "In-memory store cleared");
        Ok(())
    }
}
