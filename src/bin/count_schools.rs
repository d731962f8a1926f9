//! School tally CLI: schools.json -> school_counts_by_zip.csv.

use anyhow::Context;
use clap::Parser;
use propeval::{config::ListingsConfig, schools::tally_schools};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "count-schools")]
struct Args {
    /// Schools export with a top-level `results` array.
    #[arg(long)]
    input: Option<PathBuf>,

    /// CSV output path.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let paths = ListingsConfig::load_or_default()?;
    let input = args.input.unwrap_or(paths.schools_path);
    let output = args.output.unwrap_or(paths.school_counts_path);

    let zips = tally_schools(&input, &output)
        .with_context(|| format!("Failed to tally schools from {}", input.display()))?;
    println!("Written: {} ({} ZIP codes)", output.display(), zips);

    Ok(())
}
