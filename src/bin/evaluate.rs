//! Evaluation CLI: score labelled result files and report Precision@K, MRR, NDCG@K.

use clap::Parser;
use propeval::{config::EvaluationConfig, eval::Metric};
use std::path::PathBuf;

/// Score offline-labelled ranking results. Each metric reads its own file and
/// is reported independently.
#[derive(Parser, Debug)]
#[command(name = "evaluate")]
struct Args {
    /// Binary relevance labels (default: k_precision_result.json).
    #[arg(long)]
    precision: Option<PathBuf>,

    /// Per-query reciprocal ranks (default: mrr_result.json).
    #[arg(long)]
    mrr: Option<PathBuf>,

    /// Graded relevance labels (default: ndcg_result.json).
    #[arg(long)]
    ndcg: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let evaluation = EvaluationConfig::load_or_default()?;

    let inputs = [
        (Metric::Precision, args.precision.unwrap_or(evaluation.precision_path)),
        (Metric::Mrr, args.mrr.unwrap_or(evaluation.mrr_path)),
        (Metric::Ndcg, args.ndcg.unwrap_or(evaluation.ndcg_path)),
    ];

    let mut failures = 0;
    for (metric, path) in &inputs {
        match metric.summary(path) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("{} failed ({}): {}", metric.name(), path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        log::error!("{} of {} metrics could not be computed", failures, inputs.len());
        std::process::exit(1);
    }

    Ok(())
}
