//! Memory configuration.
//!
//! [`MemoryConfig`] lists every recognized option with its default. It is
//! versioned: a config written for another version is rejected by
//! [`MemoryConfig::validate`] rather than half-understood.
//!
//! Sources: JSON file ([`MemoryConfig::from_file`]) or environment
//! ([`MemoryConfig::from_env`]):
//!
//! | Variable | Field |
//! |---|---|
//! | `MEMORY_TOKEN_LIMIT` | `token_limit` |
//! | `MEMORY_SAFETY_MARGIN` | `safety_margin` |
//! | `MEMORY_FALLBACK_MARGIN` | `fallback_margin` |
//! | `MEMORY_CHUNK_SIZE` / `MEMORY_CHUNK_OVERLAP` | `chunk_size` / `chunk_overlap` |
//! | `MEMORY_OVERSIZE_POLICY` | `oversize_policy` (`truncate` \| `chunk_average`) |
//! | `MEMORY_METRIC` | `metric` (`cosine` \| `euclidean`) |
//! | `MEMORY_STORE` / `MEMORY_SQLITE_PATH` | `store` (`inmemory` \| `sqlite`) |
//! | `MEMORY_CHARS_PER_TOKEN` | `chars_per_token` |
//! | `MEMORY_TOKENIZER_FILE` | `tokenizer_file` |
//!
//! Embedding backend settings come from [`EnvEmbeddingConfig::from_env`].

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use embedding::EnvEmbeddingConfig;
use memory_core::DistanceMetric;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokens::{CharEstimateTokenizer, ChunkError, TextChunker, TokenAccountant};

/// The only config version this build understands.
pub const CONFIG_VERSION: u32 = 1;

/// Default SQLite file when `MEMORY_STORE=sqlite` and no path is given.
pub const DEFAULT_SQLITE_PATH: &str = "situation_memory.db";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported config version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Token limit must be greater than zero")]
    ZeroTokenLimit,

    #[error("{name} ({margin}) must be smaller than the token limit ({token_limit})")]
    MarginTooLarge {
        name: &'static str,
        margin: usize,
        token_limit: usize,
    },

    #[error("token_limit - {name} leaves {budget} tokens, not more than the {marker_tokens}-token truncation marker")]
    BudgetBelowMarker {
        name: &'static str,
        budget: usize,
        marker_tokens: usize,
    },

    #[error("Invalid chunking: {0}")]
    Chunking(#[from] ChunkError),

    #[error("Chunk size ({chunk_size}) must not exceed the token limit ({token_limit})")]
    ChunkLargerThanLimit { chunk_size: usize, token_limit: usize },

    #[error("chars_per_token must be greater than zero")]
    ZeroCharsPerToken,

    #[error("Invalid embedding config: {0}")]
    Embedding(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Tokenizer unavailable: {0}")]
    Tokenizer(String),
}

/// What to do with a situation longer than the provider's token limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Embed a truncated prefix; the stored text ends with the truncation marker.
    #[default]
    Truncate,
    /// Embed overlapping chunks and store the element-wise mean.
    ChunkAverage,
}

impl FromStr for OversizePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncate" => Ok(OversizePolicy::Truncate),
            "chunk_average" | "chunk-average" | "chunk" => Ok(OversizePolicy::ChunkAverage),
            _ => Err(ConfigError::InvalidValue {
                key: "MEMORY_OVERSIZE_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

/// Which vector store backs a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    InMemory,
    Sqlite { path: String },
}

/// Full configuration of a situation memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    pub version: u32,
    pub embedding: EnvEmbeddingConfig,
    /// Provider input ceiling in tokens.
    pub token_limit: usize,
    /// Headroom below `token_limit` for the client's truncate-and-retry.
    pub safety_margin: usize,
    /// Larger headroom for the facade's last-chance retry of a failed pair.
    pub fallback_margin: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub oversize_policy: OversizePolicy,
    pub metric: DistanceMetric,
    pub store: StoreConfig,
    /// Ratio for the character-estimate tokenizer.
    pub chars_per_token: usize,
    /// `tokenizer.json` to count with instead of the character estimate
    /// (requires the `huggingface` feature).
    pub tokenizer_file: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            embedding: EnvEmbeddingConfig::default(),
            token_limit: 8191,
            safety_margin: 100,
            fallback_margin: 500,
            chunk_size: 2000,
            chunk_overlap: 200,
            oversize_policy: OversizePolicy::Truncate,
            metric: DistanceMetric::Cosine,
            store: StoreConfig::InMemory,
            chars_per_token: 4,
            tokenizer_file: None,
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: v }),
        None => Ok(default),
    }
}

/// A truncation budget must have room for at least one token besides the marker.
pub(crate) fn check_marker_budget(
    accountant: &TokenAccountant,
    name: &'static str,
    budget: usize,
) -> Result<(), ConfigError> {
    let marker_tokens = accountant.marker_tokens();
    if budget <= marker_tokens {
        return Err(ConfigError::BudgetBelowMarker {
            name,
            budget,
            marker_tokens,
        });
    }
    Ok(())
}

impl MemoryConfig {
    /// Loads from `MEMORY_*` environment variables plus the embedding backend variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(EnvEmbeddingConfig::from_env(), |key| env::var(key).ok())
    }

    /// Builds a config from a variable lookup; unset variables keep their defaults.
    pub fn from_vars<F>(embedding: EnvEmbeddingConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let metric = match lookup("MEMORY_METRIC").filter(|v| !v.trim().is_empty()) {
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "cosine" => DistanceMetric::Cosine,
                "euclidean" | "l2" => DistanceMetric::Euclidean,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MEMORY_METRIC",
                        value: v,
                    })
                }
            },
            None => defaults.metric,
        };

        let sqlite_path = lookup("MEMORY_SQLITE_PATH").filter(|v| !v.trim().is_empty());
        let store = match lookup("MEMORY_STORE").filter(|v| !v.trim().is_empty()) {
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "inmemory" | "memory" => StoreConfig::InMemory,
                "sqlite" => StoreConfig::Sqlite {
                    path: sqlite_path.unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string()),
                },
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MEMORY_STORE",
                        value: v,
                    })
                }
            },
            None => match sqlite_path {
                Some(path) => StoreConfig::Sqlite { path },
                None => defaults.store,
            },
        };

        Ok(Self {
            version: CONFIG_VERSION,
            embedding,
            token_limit: parse_var("MEMORY_TOKEN_LIMIT", lookup("MEMORY_TOKEN_LIMIT"), defaults.token_limit)?,
            safety_margin: parse_var(
                "MEMORY_SAFETY_MARGIN",
                lookup("MEMORY_SAFETY_MARGIN"),
                defaults.safety_margin,
            )?,
            fallback_margin: parse_var(
                "MEMORY_FALLBACK_MARGIN",
                lookup("MEMORY_FALLBACK_MARGIN"),
                defaults.fallback_margin,
            )?,
            chunk_size: parse_var("MEMORY_CHUNK_SIZE", lookup("MEMORY_CHUNK_SIZE"), defaults.chunk_size)?,
            chunk_overlap: parse_var(
                "MEMORY_CHUNK_OVERLAP",
                lookup("MEMORY_CHUNK_OVERLAP"),
                defaults.chunk_overlap,
            )?,
            oversize_policy: parse_var(
                "MEMORY_OVERSIZE_POLICY",
                lookup("MEMORY_OVERSIZE_POLICY"),
                defaults.oversize_policy,
            )?,
            metric,
            store,
            chars_per_token: parse_var(
                "MEMORY_CHARS_PER_TOKEN",
                lookup("MEMORY_CHARS_PER_TOKEN"),
                defaults.chars_per_token,
            )?,
            tokenizer_file: lookup("MEMORY_TOKENIZER_FILE").filter(|v| !v.trim().is_empty()),
        })
    }

    /// Reads a JSON config file. Missing fields take their defaults; an empty
    /// API key is filled from `OPENAI_API_KEY`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let read_error = |message: String| ConfigError::Read {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
        let mut config: Self = serde_json::from_str(&content).map_err(|e| read_error(e.to_string()))?;
        if config.embedding.api_key.is_empty() {
            config.embedding.api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        }
        Ok(config)
    }

    /// Checks every option; run before building anything from the config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: CONFIG_VERSION,
            });
        }
        if self.token_limit == 0 {
            return Err(ConfigError::ZeroTokenLimit);
        }
        for (name, margin) in [
            ("safety_margin", self.safety_margin),
            ("fallback_margin", self.fallback_margin),
        ] {
            if margin >= self.token_limit {
                return Err(ConfigError::MarginTooLarge {
                    name,
                    margin,
                    token_limit: self.token_limit,
                });
            }
        }
        if self.chars_per_token == 0 {
            return Err(ConfigError::ZeroCharsPerToken);
        }
        let estimate = TokenAccountant::new(Arc::new(CharEstimateTokenizer::new(self.chars_per_token)));
        for (name, margin) in [
            ("safety_margin", self.safety_margin),
            ("fallback_margin", self.fallback_margin),
        ] {
            check_marker_budget(&estimate, name, self.token_limit - margin)?;
        }
        TextChunker::validate(self.chunk_size, self.chunk_overlap)?;
        if self.chunk_size > self.token_limit {
            return Err(ConfigError::ChunkLargerThanLimit {
                chunk_size: self.chunk_size,
                token_limit: self.token_limit,
            });
        }
        self.embedding.validate().map_err(ConfigError::Embedding)?;
        Ok(())
    }
}
