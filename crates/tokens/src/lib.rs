//! # Tokens
//!
//! Token accounting for embedding inputs: counting, budget truncation and
//! overlapping token-window chunking.
//!
//! ## Modules
//!
//! - [`tokenizer`] - [`Tokenize`] trait and the default [`CharEstimateTokenizer`]
//! - [`accountant`] - [`TokenAccountant`]: count / truncate / fit to a budget
//! - [`chunker`] - [`TextChunker`]: split long text into overlapping windows
//!
//! ## Example
//!
//! ```rust
//! use tokens::{TextChunker, TokenAccountant};
//! use std::sync::Arc;
//!
//! let accountant = Arc::new(TokenAccountant::default());
//! assert_eq!(accountant.count_tokens("Hello world"), 3);
//!
//! let chunker = TextChunker::new(accountant);
//! let chunks = chunker.chunk_text("short", 10, 2).unwrap();
//! assert_eq!(chunks, vec!["short".to_string()]);
//! ```
//!
//! With the `huggingface` feature, [`HuggingFaceTokenizer`] counts with a real
//! `tokenizer.json` model instead of the character estimate.

pub mod accountant;
pub mod chunker;
pub mod tokenizer;

#[cfg(feature = "huggingface")]
pub mod huggingface;


pub use accountant::{TokenAccountant, CHUNK_AVERAGED_MARKER, TRUNCATION_MARKER};
pub use chunker::{ChunkError, TextChunker};
pub use tokenizer::{CharEstimateTokenizer, TokenSpans, Tokenize, TokenizeError};

#[cfg(feature = "huggingface")]
pub use huggingface::HuggingFaceTokenizer;
