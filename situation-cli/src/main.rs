//! situation-memory CLI: add situation/recommendation pairs, query by similarity,
//! count and clear a collection. Config from env (or --config) and CLI args.

use anyhow::{Context, Result};
use clap::Parser;
use memory::SituationMemory;
use situation_cli::{init_tracing, load_config, read_pairs, Cli, Commands};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let config = load_config(cli.config.as_deref())?;
    let memory = SituationMemory::from_config(&cli.collection, &config)
        .await
        .with_context(|| format!("Open situation memory '{}'", cli.collection))?;

    match cli.command {
        Commands::Add { file } => {
            let pairs: Vec<(String, String)> = read_pairs(&file)?
                .into_iter()
                .map(|p| (p.situation, p.recommendation))
                .collect();
            info!(file = %file.display(), pairs = pairs.len(), "step: adding situations");

            let report = memory.add_situations(&pairs).await.context("Add situations")?;
            println!("Added: {}, Skipped: {}", report.added, report.skipped);
        }
        Commands::Query { text, limit, json } => {
            let matches = memory.get_memories(&text, limit).await.context("Query memories")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else if matches.is_empty() {
                println!("No matches (collection: {}).", cli.collection);
            } else {
                for (rank, m) in matches.iter().enumerate() {
                    println!("{}. [{:.4}] {}", rank + 1, m.similarity_score, m.matched_situation.replace('\n', " "));
                    println!("   -> {}", m.recommendation);
                }
            }
        }
        Commands::Count => {
            println!("{}", memory.len().await.context("Count situations")?);
        }
        Commands::Clear => {
            memory.clear().await.context("Clear collection")?;
            println!("Cleared collection {}.", cli.collection);
        }
    }

    Ok(())
}
