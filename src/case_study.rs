//! Case studies: rank a location's listings with a case study's weights and
//! check where its hand-picked benchmark properties land.

use crate::error::Result;
use crate::eval::records::{load_records, Record};
use crate::listings::write_json_pretty;
use crate::ranking::{rank_properties, NeighborhoodData, RankedProperty, RankingWeights};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Number of top results kept in each comparison.
pub const SYSTEM_RESULTS: usize = 10;

/// A known-desirable listing the ranker should surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkProperty {
    pub id: String,
    #[serde(default)]
    pub desirability_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// How a public listing site ranked a comparable property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicListing {
    pub platform: String,
    #[serde(default)]
    pub url: String,
    pub rank: u32,
    #[serde(default)]
    pub key_features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
    pub name: String,
    #[serde(default)]
    pub query: String,
    /// City, state or ZIP fragment; empty means every listing.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub weights: RankingWeights,
    #[serde(default)]
    pub benchmark_properties: Vec<BenchmarkProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_listings: Option<Vec<PublicListing>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkComparison {
    pub benchmark_in_top5: usize,
    pub benchmark_in_top10: usize,
    /// 0 when no benchmark property was found.
    pub benchmark_median_rank: f64,
    pub benchmark_average_score: f64,
    pub non_benchmark_average_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub case_study: CaseStudy,
    /// Top ranked listings, each carrying its `rankingScore`.
    pub system_results: Vec<Record>,
    pub benchmark_comparison: BenchmarkComparison,
    pub analysis_notes: Vec<String>,
}

/// Read a JSON array of case studies.
pub fn load_case_studies(path: &Path) -> Result<Vec<CaseStudy>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Listings whose city or state contains `location` (case-insensitive) or
/// whose ZIP code contains it. An empty location keeps everything.
pub fn filter_by_location(properties: &[Record], location: &str) -> Vec<Record> {
    if location.is_empty() {
        return properties.to_vec();
    }
    let needle = location.to_lowercase();
    let text = |record: &Record, key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    properties
        .iter()
        .filter(|&p| {
            text(p, "city").is_some_and(|c| c.to_lowercase().contains(&needle))
                || text(p, "state").is_some_and(|s| s.to_lowercase().contains(&needle))
                || text(p, "zipCode").is_some_and(|z| z.contains(location))
        })
        .cloned()
        .collect()
}

/// 1-based ranks of the benchmark ids that appear in `ranked`, in benchmark order.
pub fn benchmark_ranks(ranked: &[RankedProperty], ids: &[&str]) -> Vec<usize> {
    ids.iter()
        .filter_map(|id| ranked.iter().position(|p| p.id() == Some(*id)))
        .map(|idx| idx + 1)
        .collect()
}

/// Median of `ranks`; the mean of the middle two for an even count, 0 when empty.
pub fn median_rank(ranks: &[usize]) -> f64 {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n == 0 {
        0.0
    } else if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
    } else {
        sorted[n / 2] as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Short verdicts on a comparison, each starting with ✅ or ⚠️.
pub fn analysis_notes(comparison: &BenchmarkComparison) -> Vec<String> {
    let mut notes = Vec::new();

    if comparison.benchmark_in_top10 == 0 {
        notes.push("⚠️ No benchmark properties found in top 10 results".to_string());
    } else if comparison.benchmark_in_top5 > 0 {
        notes.push(format!(
            "✅ {} benchmark properties found in top 5 results",
            comparison.benchmark_in_top5
        ));
    }

    if comparison.benchmark_average_score > comparison.non_benchmark_average_score {
        notes.push(
            "✅ Benchmark properties score higher on average than non-benchmark properties"
                .to_string(),
        );
    } else {
        notes.push(
            "⚠️ Benchmark properties score lower on average than non-benchmark properties"
                .to_string(),
        );
    }

    let median = comparison.benchmark_median_rank;
    if median > 0.0 && median <= 20.0 {
        notes.push(format!("✅ Median rank of benchmark properties is {}", median));
    } else if median > 20.0 {
        notes.push(format!("⚠️ Median rank of benchmark properties is {} (> 20)", median));
    }

    notes
}

/// Run one case study over `properties`.
pub fn compare(
    case_study: &CaseStudy,
    properties: &[Record],
    data: &NeighborhoodData,
) -> ComparisonResult {
    let candidates = filter_by_location(properties, &case_study.location);
    log::info!(
        "Case study '{}': {} of {} listings match location '{}'",
        case_study.name,
        candidates.len(),
        properties.len(),
        case_study.location
    );

    let ranked = rank_properties(&candidates, &case_study.weights, data);
    let ids: Vec<&str> = case_study
        .benchmark_properties
        .iter()
        .map(|b| b.id.as_str())
        .collect();
    let ranks = benchmark_ranks(&ranked, &ids);

    let (benchmark, others): (Vec<&RankedProperty>, Vec<&RankedProperty>) = ranked
        .iter()
        .partition(|p| p.id().is_some_and(|id| ids.contains(&id)));
    let benchmark_scores: Vec<f64> = benchmark.iter().map(|p| p.score).collect();
    let other_scores: Vec<f64> = others.iter().map(|p| p.score).collect();

    let comparison = BenchmarkComparison {
        benchmark_in_top5: ranks.iter().filter(|&&r| r <= 5).count(),
        benchmark_in_top10: ranks.iter().filter(|&&r| r <= 10).count(),
        benchmark_median_rank: median_rank(&ranks),
        benchmark_average_score: mean(&benchmark_scores),
        non_benchmark_average_score: mean(&other_scores),
    };
    let analysis_notes = analysis_notes(&comparison);

    ComparisonResult {
        case_study: case_study.clone(),
        system_results: ranked
            .into_iter()
            .take(SYSTEM_RESULTS)
            .map(|p| p.record)
            .collect(),
        benchmark_comparison: comparison,
        analysis_notes,
    }
}

/// Run every case study in `case_studies_path` against the listings in
/// `properties_path` and write the results to `output_path`.
pub fn run_case_studies(
    case_studies_path: &Path,
    properties_path: &Path,
    output_path: &Path,
    data: &NeighborhoodData,
) -> Result<Vec<ComparisonResult>> {
    let case_studies = load_case_studies(case_studies_path)?;
    let properties = load_records(properties_path)?;
    log::info!(
        "Loaded {} case studies and {} properties",
        case_studies.len(),
        properties.len()
    );

    let results: Vec<ComparisonResult> = case_studies
        .iter()
        .map(|case_study| compare(case_study, &properties, data))
        .collect();

    write_json_pretty(output_path, &results)?;
    Ok(results)
}
