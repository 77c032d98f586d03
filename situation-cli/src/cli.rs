//! CLI parser, config loading and the pairs file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use memory::MemoryConfig;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "situation-memory")]
#[command(about = "Situation memory CLI: add, query, count, clear", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Collection to operate on.
    #[arg(short, long, global = true, default_value = "situation_memory")]
    pub collection: String,

    /// JSON config file; MEMORY_* environment variables are used when absent.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Embed and store the situation/recommendation pairs of a JSON file.
    Add {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print the stored situations most similar to a text.
    Query {
        #[arg(short, long)]
        text: String,
        #[arg(short, long, default_value = "3")]
        limit: usize,
        /// Print matches as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the number of stored situations.
    Count,
    /// Remove every stored situation of the collection.
    Clear,
}

/// One entry of the pairs file: `[{"situation": "...", "recommendation": "..."}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationPair {
    pub situation: String,
    pub recommendation: String,
}

/// Loads the memory config from `path` if given, otherwise from the environment.
pub fn load_config(path: Option<&Path>) -> Result<MemoryConfig> {
    let config = match path {
        Some(path) => MemoryConfig::from_file(path)
            .with_context(|| format!("Load memory config from {}", path.display()))?,
        None => MemoryConfig::from_env().context("Load memory config from MEMORY_* environment variables")?,
    };
    config.validate().context("Validate memory config")?;
    Ok(config)
}

/// Reads the pairs file.
pub fn read_pairs(path: &Path) -> Result<Vec<SituationPair>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Read pairs file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Parse pairs file {}", path.display()))
}
