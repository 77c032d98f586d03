//! # Memory Crate
//!
//! Semantic situation memory: past decision situations and their
//! recommendations are embedded and recalled by nearest-neighbour similarity.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use memory::{MemoryConfig, SituationMemory};
//!
//! async fn example() -> Result<(), memory::MemoryError> {
//!     let config = MemoryConfig::from_env()?;
//!     let memory = SituationMemory::from_config("trader_memory", &config).await?;
//!
//!     memory
//!         .add_situations(&[("High inflation with rising rates", "Favor defensive sectors")])
//!         .await?;
//!
//!     for m in memory.get_memories("High inflation environment", 1).await? {
//!         println!("{:.3} {}", m.similarity_score, m.recommendation);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`] - EmbeddingClient: token-bounded embedding with one truncate-and-retry
//! - [`attempt`] - EmbeddingAttempt: classified outcome of one provider call
//! - [`situation`] - SituationMemory facade
//! - [`config`] - versioned MemoryConfig
//! - [`builder`] - provider/store/accountant construction from config
//! - [`error`] - EmbeddingError, MemoryError
//!
//! ## External Interactions
//!
//! - **Embedding services**: `openai-embedding` (cloud) or `local-embedding`, chosen by backend URL
//! - **Storage backends**: `memory-inmemory` or `memory-sqlite` via the `memory-core` `VectorStore` trait
//! - **Token counting**: the `tokens` crate

pub mod attempt;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod situation;


pub use attempt::{EmbeddingAttempt, RetryReason};
pub use client::{EmbeddedText, EmbeddingClient, EmbeddingClientOptions};
pub use config::{ConfigError, MemoryConfig, OversizePolicy, StoreConfig, CONFIG_VERSION};
pub use error::{EmbeddingError, MemoryError};
pub use situation::{AddReport, MemoryOptions, SituationMemory};

pub use memory_core::{DistanceMetric, SituationMatch};
