//! Argument parsing and pairs-file tests for situation-cli.

use std::io::Write;
use std::path::Path;

use clap::Parser;
use situation_cli::{read_pairs, Cli, Commands, SituationPair};

#[test]
fn test_parse_query_with_globals() {
    let cli = Cli::try_parse_from([
        "situation-memory",
        "query",
        "--text",
        "High inflation environment",
        "--limit",
        "5",
        "--collection",
        "trader",
    ])
    .unwrap();

    assert_eq!(cli.collection, "trader");
    assert_eq!(
        cli.command,
        Commands::Query {
            text: "High inflation environment".to_string(),
            limit: 5,
            json: false
        }
    );
}

#[test]
fn test_parse_defaults() {
    let cli = Cli::try_parse_from(["situation-memory", "query", "-t", "rates"]).unwrap();
    assert_eq!(cli.collection, "situation_memory");
    assert!(cli.config.is_none());
    assert!(cli.log_file.is_none());
    assert!(matches!(cli.command, Commands::Query { limit: 3, .. }));

    let cli = Cli::try_parse_from(["situation-memory", "--config", "memory.json", "count"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("memory.json")));
    assert_eq!(cli.command, Commands::Count);
}

#[test]
fn test_parse_requires_subcommand_arguments() {
    assert!(Cli::try_parse_from(["situation-memory", "add"]).is_err());
    assert!(Cli::try_parse_from(["situation-memory", "query"]).is_err());
    assert!(Cli::try_parse_from(["situation-memory"]).is_err());
}

#[test]
fn test_read_pairs() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"situation": "High inflation with rising rates", "recommendation": "Favor defensive sectors"}},
            {{"situation": "Oil supply shock", "recommendation": "Overweight energy producers"}}
        ]"#
    )
    .unwrap();

    let pairs = read_pairs(file.path()).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(
        pairs[0],
        SituationPair {
            situation: "High inflation with rising rates".to_string(),
            recommendation: "Favor defensive sectors".to_string(),
        }
    );
}

#[test]
fn test_read_pairs_errors() {
    assert!(read_pairs(Path::new("/nonexistent/pairs.json")).is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"[{{"situation": "missing recommendation"}}]"#).unwrap();
    let err = read_pairs(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Parse pairs file"));
}
