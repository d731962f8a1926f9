//! Description CLI: generate a property description per address, appending
//! each result to a JSON-lines log so an interrupted run can resume.

use anyhow::Context;
use clap::Parser;
use propeval::{
    generate::{generate_descriptions, DescriptionJournal, EnvSecretProvider, GeminiClient},
    listings::load_addresses,
    Config,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "describe")]
struct Args {
    /// Address list produced by `listings extract-addresses`.
    #[arg(long)]
    addresses: Option<PathBuf>,

    /// JSON-lines output log (appended to, never rewritten).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load_or_default()?;
    let addresses_path = args.addresses.unwrap_or(config.listings.addresses_path);
    let output_path = args.output.unwrap_or(config.listings.descriptions_path);

    let addresses = load_addresses(&addresses_path)
        .with_context(|| format!("Failed to read addresses from {}", addresses_path.display()))?;

    let secrets = EnvSecretProvider::new();
    let client = GeminiClient::from_config(&config.generation, &secrets)?;
    let mut journal = DescriptionJournal::open(&output_path)
        .with_context(|| format!("Failed to open {}", output_path.display()))?;

    println!(
        "Generating descriptions for {} addresses ({} already done)\n",
        addresses.len(),
        journal.completed()
    );

    let summary = generate_descriptions(&addresses, &client, &mut journal, &config.generation).await?;

    println!("\n=== Description Generation ===");
    println!("Skipped (already done): {}", summary.skipped);
    println!("Generated:              {}", summary.generated);
    println!("Failed:                 {}", summary.failed);
    println!("Descriptions saved incrementally to {}", output_path.display());

    Ok(())
}
