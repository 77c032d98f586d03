//! # Memory Core
//!
//! Core types and traits for situation storage and nearest-neighbour lookup.
//! Used by the `memory` crate and the store backends (`memory-inmemory`, `memory-sqlite`).
//!
//! ## Modules
//!
//! - [`types`] - StoredSituation, Neighbor, SituationMatch
//! - [`metric`] - DistanceMetric (distance and similarity mapping)
//! - [`store`] - VectorStore trait and the brute-force ranking shared by backends
//! - [`error`] - StoreError

pub mod error;
pub mod metric;
pub mod store;
pub mod types;

#[cfg(test)]
mod store_test;

pub use error::*;
pub use metric::*;
pub use store::*;
pub use types::*;
