//! # Vector Storage
//!
//! This module defines the storage interface for situations and their embeddings.
//!
//! The `VectorStore` trait is implemented by storage backends (in-memory, SQLite).
//! Both backends rank by brute force through [`rank_neighbors`].

use async_trait::async_trait;

use crate::error::StoreError;
use crate::metric::DistanceMetric;
use crate::types::{Neighbor, StoredSituation};

/// A named collection of situations supporting append and nearest-neighbour query.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Metric used to order query results.
    fn metric(&self) -> DistanceMetric;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Appends records. Every embedding must match the collection dimension
    /// (fixed by the first record ever stored); on mismatch nothing is stored.
    async fn add(&self, records: Vec<StoredSituation>) -> Result<(), StoreError>;

    /// Returns up to `k` nearest records, nearest first. An empty store or
    /// `k == 0` yields an empty list.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<Neighbor>, StoreError>;

    /// Removes every record of the collection; the dimension is released too.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Checks that every embedding in `records` has the same dimension as the
/// collection (or, for an empty collection, as the first record).
///
/// Returns the dimension the collection has after the add.
pub fn check_batch_dimension(
    collection_dimension: Option<usize>,
    records: &[StoredSituation],
) -> Result<Option<usize>, StoreError> {
    let mut expected = collection_dimension;
    for record in records {
        let actual = record.dimension();
        match expected {
            Some(expected) if expected != actual => {
                return Err(StoreError::DimensionMismatch { expected, actual });
            }
            Some(_) => {}
            None => expected = Some(actual),
        }
    }
    Ok(expected)
}

/// Checks a query embedding against the collection dimension. An empty
/// collection (no dimension yet) accepts any query.
pub fn check_query_dimension(collection_dimension: Option<usize>, query: &[f32]) -> Result<(), StoreError> {
    match collection_dimension {
        Some(expected) if expected != query.len() => Err(StoreError::DimensionMismatch {
            expected,
            actual: query.len(),
        }),
        _ => Ok(()),
    }
}

/// Ranks `candidates` by distance to `query` and keeps the `k` nearest.
///
/// Ties keep candidate order, so records inserted earlier win. NaN distances
/// rank after every other distance.
pub fn rank_neighbors<'a, I>(metric: DistanceMetric, query: &[f32], candidates: I, k: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = &'a StoredSituation>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f32, &StoredSituation)> = candidates
        .into_iter()
        .map(|record| (metric.distance(query, &record.embedding), record))
        .collect();

    scored.sort_by(|a, b| nan_last(a.0).total_cmp(&nan_last(b.0)));

    scored
        .into_iter()
        .take(k)
        .map(|(distance, record)| Neighbor {
            text: record.text.clone(),
            recommendation: record.recommendation.clone(),
            distance,
        })
        .collect()
}

fn nan_last(distance: f32) -> f32 {
    if distance.is_nan() {
        f32::INFINITY
    } else {
        distance
    }
}
