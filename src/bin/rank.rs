//! Ranking CLI: score listings from neighborhood data and write them best first.

use anyhow::Context;
use clap::Parser;
use propeval::{
    config::RankingConfig,
    eval::records::load_records,
    listings::write_json_pretty,
    ranking::{rank_properties, NeighborhoodData, RankingWeights},
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rank")]
struct Args {
    /// Listings to rank (JSON array of objects).
    #[arg(long)]
    properties: Option<PathBuf>,

    /// JSON object of factor weights (default: the standard weighting).
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Output path for the ranked listings.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of top listings to print.
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let paths = RankingConfig::load_or_default()?;
    let properties_path = args.properties.unwrap_or(paths.properties_path);
    let output = args.output.unwrap_or(paths.ranked_path);

    let weights = match &args.weights {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read weights from {}", path.display()))?;
            serde_json::from_str::<RankingWeights>(&content)
                .with_context(|| format!("Invalid weights in {}", path.display()))?
        }
        None => RankingWeights::standard(),
    };

    let data = NeighborhoodData::load(
        &paths.crime_path,
        &paths.hospital_path,
        &paths.school_counts_path,
    )
    .context("Failed to load neighborhood data")?;
    let properties = load_records(&properties_path)
        .with_context(|| format!("Failed to read {}", properties_path.display()))?;

    let ranked = rank_properties(&properties, &weights, &data);
    for (idx, property) in ranked.iter().take(args.top).enumerate() {
        println!(
            "{:>3}. {:.4}  {}",
            idx + 1,
            property.score,
            property.id().unwrap_or("<no id>")
        );
    }

    let records: Vec<_> = ranked.into_iter().map(|p| p.record).collect();
    write_json_pretty(&output, &records)?;
    println!("\nRanked {} listings into {}", records.len(), output.display());

    Ok(())
}
