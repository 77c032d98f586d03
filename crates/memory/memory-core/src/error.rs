use thiserror::Error;

/// Failure reported by a vector store backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// An embedding does not match the dimension already fixed for the collection.
    #[error("Embedding dimension mismatch: collection uses {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Store backend error: {0}")]
    Backend(String),

    /// A persisted record could not be decoded.
    #[error("Corrupt record {id}: {message}")]
    Corrupt { id: String, message: String },
}
