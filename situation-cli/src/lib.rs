//! # situation-cli
//!
//! Command-line front end for situation memory: argument parsing, config
//! loading, logging setup and the pairs-file format.

pub mod cli;
pub mod logger;

pub use cli::{load_config, read_pairs, Cli, Commands, SituationPair};
pub use logger::init_tracing;
