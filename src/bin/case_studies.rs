//! Case study CLI: check where benchmark listings land under each case study's weights.

use anyhow::Context;
use clap::Parser;
use propeval::{case_study::run_case_studies, config::RankingConfig, ranking::NeighborhoodData};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "case-studies")]
struct Args {
    /// Case study definitions (JSON array).
    #[arg(long)]
    case_studies: Option<PathBuf>,

    /// Listings to rank.
    #[arg(long)]
    properties: Option<PathBuf>,

    /// Output path for the comparison results.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let paths = RankingConfig::load_or_default()?;
    let case_studies = args.case_studies.unwrap_or(paths.case_studies_path);
    let properties = args.properties.unwrap_or(paths.properties_path);
    let output = args.output.unwrap_or(paths.results_path);

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let data = NeighborhoodData::load(
        &paths.crime_path,
        &paths.hospital_path,
        &paths.school_counts_path,
    )
    .context("Failed to load neighborhood data")?;
    let results = run_case_studies(&case_studies, &properties, &output, &data)
        .with_context(|| format!("Failed to run case studies from {}", case_studies.display()))?;

    if results.is_empty() {
        println!("No case study results were generated.");
        return Ok(());
    }

    println!("Summary of findings:");
    for result in &results {
        println!("\n{}:", result.case_study.name);
        for note in &result.analysis_notes {
            println!("  {}", note);
        }
    }
    println!("\nFull results saved to {}", output.display());

    Ok(())
}
