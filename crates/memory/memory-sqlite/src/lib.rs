//! # SQLite Vector Store
//!
//! This crate provides an SQLite-based implementation of the `VectorStore` trait.
//!
//! ## SQLiteVectorStore
//!
//! Persistent storage for situations and their embeddings. Several named
//! collections can share one database file.
//!
//! **Advantages**:
//! - Persistent storage (data survives restarts)
//! - No external database required
//!
//! **Limitations**:
//! - Query loads the whole collection and ranks it in memory
//!
//! ## Example
//!
//! ```rust,no_run
//! use memory_sqlite::SQLiteVectorStore;
//! use memory_core::{StoredSituation, VectorStore};
//!
//! async fn example() -> Result<(), memory_core::StoreError> {
//!     let store = SQLiteVectorStore::open("memory.db", "trader_memory").await?;
//!     store
//!         .add(vec![StoredSituation::new("0", "High inflation", "Favor value stocks", vec![1.0, 0.0])])
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE situations (
//!     collection TEXT NOT NULL,
//!     id TEXT NOT NULL,
//!     text TEXT NOT NULL,
//!     recommendation TEXT NOT NULL,
//!     dimension INTEGER NOT NULL,
//!     embedding BLOB NOT NULL,
//!     PRIMARY KEY (collection, id)
//! );
//! ```
//!
//! Embeddings are stored little-endian, 4 bytes per float. Rows are read back
//! in insertion (rowid) order, which is also the tie-break order for queries.

use memory_core::{
    check_batch_dimension, check_query_dimension, rank_neighbors, DistanceMetric, Neighbor, StoreError,
    StoredSituation, VectorStore,
};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use tracing::{info, warn};

/// SQLite-backed store for one named collection.
#[derive(Clone)]
pub struct SQLiteVectorStore {
    pool: SqlitePool,
    collection: String,
    metric: DistanceMetric,
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_embedding(id: &str, blob: &[u8], dimension: usize) -> Result<Vec<f32>, StoreError> {
    if blob.len() != dimension * 4 {
        return Err(StoreError::Corrupt {
            id: id.to_string(),
            message: format!(
                "embedding blob has {} bytes, expected {} for dimension {}",
                blob.len(),
                dimension * 4,
                dimension
            ),
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

impl SQLiteVectorStore {
    /// Opens (creating if missing) the database file and binds to `collection`,
    /// using cosine distance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if connection or schema initialization fails.
    pub async fn open(database_path: &str, collection: &str) -> Result<Self, StoreError> {
        Self::open_with_metric(database_path, collection, DistanceMetric::Cosine).await
    }

    pub async fn open_with_metric(
        database_path: &str,
        collection: &str,
        metric: DistanceMetric,
    ) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(database_path);

        let pool = SqlitePool::connect_with(options).await.map_err(backend)?;
        let store = Self::from_pool(pool, collection, metric).await?;

        info!(
            database_path = %database_path,
            collection = %collection,
            metric = metric.as_str(),
            "SQLite vector store opened"
        );
        Ok(store)
    }

    /// Binds to `collection` on an existing pool; several stores may share one pool.
    pub async fn from_pool(
        pool: SqlitePool,
        collection: &str,
        metric: DistanceMetric,
    ) -> Result<Self, StoreError> {
        let store = Self {
            pool,
            collection: collection.to_string(),
            metric,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS situations (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                recommendation TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_situations_collection ON situations(collection);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    /// Embedding dimension of the collection, once the first record is stored.
    pub async fn dimension(&self) -> Result<Option<usize>, StoreError> {
        let dimension: Option<i64> =
            sqlx::query_scalar::<_, i64>("SELECT dimension FROM situations WHERE collection = ?1 LIMIT 1")
                .bind(&self.collection)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(dimension.map(|d| d as usize))
    }

    /// Closes the underlying pool. Other clones of this store stop working.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_situation(row: &sqlx::sqlite::SqliteRow) -> Result<StoredSituation, StoreError> {
        let id: String = row.try_get("id").map_err(backend)?;
        let text: String = row.try_get("text").map_err(backend)?;
        let recommendation: String = row.try_get("recommendation").map_err(backend)?;
        let dimension: i64 = row.try_get("dimension").map_err(backend)?;
        let blob: Vec<u8> = row.try_get("embedding").map_err(backend)?;

        let embedding = decode_embedding(&id, &blob, dimension as usize)?;
        Ok(StoredSituation {
            id,
            text,
            recommendation,
            embedding,
        })
    }
}

#[async_trait::async_trait]
impl VectorStore for SQLiteVectorStore {
    fn name(&self) -> &str {
        &self.collection
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM situations WHERE collection = ?1")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(count as usize)
    }

    /// Inserts all records in one transaction; a failure stores none of them.
    async fn add(&self, records: Vec<StoredSituation>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(backend)?;

        let existing: Option<i64> =
            sqlx::query_scalar::<_, i64>("SELECT dimension FROM situations WHERE collection = ?1 LIMIT 1")
                .bind(&self.collection)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
        if let Err(e) = check_batch_dimension(existing.map(|d| d as usize), &records) {
            warn!(collection = %self.collection, error = %e, "SQLite store rejected batch");
            return Err(e);
        }

        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO situations (
                    collection, id, text, recommendation, dimension, embedding
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&self.collection)
            .bind(&record.id)
            .bind(&record.text)
            .bind(&record.recommendation)
            .bind(record.dimension() as i64)
            .bind(encode_embedding(&record.embedding))
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;

        info!(
            collection = %self.collection,
            added = records.len(),
            "step: SQLite store add"
        );
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<Neighbor>, StoreError> {
        check_query_dimension(self.dimension().await?, embedding)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, text, recommendation, dimension, embedding FROM situations WHERE collection = ?1 ORDER BY rowid",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(Self::row_to_situation(row)?);
        }

        let neighbors = rank_neighbors(self.metric, embedding, &records, k);
        info!(
            collection = %self.collection,
            scanned = records.len(),
            k,
            count = neighbors.len(),
            "step: SQLite store query"
        );
        Ok(neighbors)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM situations WHERE collection = ?1")
            .bind(&self.collection)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        info!(
            collection = %self.collection,
            removed = result.rows_affected(),
            "SQLite store cleared"
        );
        Ok(())
    }
}
