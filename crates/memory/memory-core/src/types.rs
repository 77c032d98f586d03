//! # Core Types
//!
//! ## StoredSituation
//!
//! One persisted record: the situation text that was embedded, its recommendation,
//! and the embedding. Records are immutable once stored.
//!
//! ## Neighbor
//!
//! A store-level query row, carrying the raw distance under the store's metric.
//!
//! ## SituationMatch
//!
//! What callers of the memory receive: the neighbour with distance mapped to a similarity score.

use serde::{Deserialize, Serialize};

/// A single stored situation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSituation {
    /// Collection-unique id; assigned by the caller as `count + batch_index`.
    pub id: String,
    /// The situation text that was actually embedded (may carry a truncation marker).
    pub text: String,
    /// Advice associated with the situation.
    pub recommendation: String,
    pub embedding: Vec<f32>,
}

impl StoredSituation {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        recommendation: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            recommendation: recommendation.into(),
            embedding,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

/// A query row returned by a [`crate::VectorStore`], nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub text: String,
    pub recommendation: String,
    /// Distance under the store's [`crate::DistanceMetric`]; smaller is closer.
    pub distance: f32,
}

/// A retrieved precedent for a query situation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SituationMatch {
    pub matched_situation: String,
    pub recommendation: String,
    /// Higher is more similar. For cosine distance this lies in [-1, 1].
    pub similarity_score: f32,
}
