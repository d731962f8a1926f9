//! Summary lines and file-to-score evaluation for each metric.

use crate::error::{PropevalError, Result};
use crate::eval::metrics::{
    mean_reciprocal_rank, ndcg_at_k, precision_at_k, MeanReciprocalRank, NdcgAtK, PrecisionAtK,
};
use crate::eval::records::{binary_relevance, graded_relevance, load_records, reciprocal_ranks};
use std::fmt;
use std::path::Path;

impl fmt::Display for PrecisionAtK {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Precision@{} = {:.4} ({}/{} relevant)",
            self.k, self.precision, self.relevant, self.k
        )
    }
}

impl fmt::Display for MeanReciprocalRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MRR = {:.4} ({:.2}/{})", self.mrr, self.sum, self.count)
    }
}

impl fmt::Display for NdcgAtK {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NDCG@{} = {:.4}", self.k, self.ndcg)
    }
}

/// Score a binary-labelled result set stored at `path`.
pub fn evaluate_precision(path: &Path) -> Result<PrecisionAtK> {
    let records = load_records(path)?;
    log::debug!("Loaded {} precision records from {}", records.len(), path.display());
    Ok(precision_at_k(&binary_relevance(&records)))
}

/// Average the per-query reciprocal ranks stored at `path`.
pub fn evaluate_mrr(path: &Path) -> Result<MeanReciprocalRank> {
    let records = load_records(path)?;
    log::debug!("Loaded {} MRR records from {}", records.len(), path.display());
    let source = path.display().to_string();
    Ok(mean_reciprocal_rank(&reciprocal_ranks(&records, &source)?))
}

/// Score a graded result set stored at `path`.
pub fn evaluate_ndcg(path: &Path) -> Result<NdcgAtK> {
    let records = load_records(path)?;
    log::debug!("Loaded {} graded records from {}", records.len(), path.display());
    let source = path.display().to_string();
    let scored = ndcg_at_k(&graded_relevance(&records, &source)?);
    if !scored.dcg.is_finite() || !scored.idcg.is_finite() {
        return Err(PropevalError::InvalidInput(format!(
            "{}: graded relevances are too large, DCG overflows",
            source
        )));
    }
    Ok(scored)
}

/// The three independent metrics, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Precision,
    Mrr,
    Ndcg,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Precision, Metric::Mrr, Metric::Ndcg];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Precision => "Precision@K",
            Metric::Mrr => "MRR",
            Metric::Ndcg => "NDCG@K",
        }
    }

    /// Evaluate this metric over `path` and render its summary line.
    pub fn summary(self, path: &Path) -> Result<String> {
        Ok(match self {
            Metric::Precision => evaluate_precision(path)?.to_string(),
            Metric::Mrr => evaluate_mrr(path)?.to_string(),
            Metric::Ndcg => evaluate_ndcg(path)?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn precision_summary_line() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "k_precision_result.json",
            r#"[{"relevance":true},{"relevance":false},{"relevance":true},{"relevance":true}]"#,
        );
        assert_eq!(
            Metric::Precision.summary(&path).unwrap(),
            "Precision@4 = 0.7500 (3/4 relevant)"
        );
    }

    #[test]
    fn mrr_summary_line() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "mrr_result.json", r#"[{"mrr":1.0},{"mrr":0.5},{"mrr":0}]"#);
        assert_eq!(Metric::Mrr.summary(&path).unwrap(), "MRR = 0.5000 (1.50/3)");
    }

    #[test]
    fn ndcg_summary_line() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ndcg_result.json",
            r#"[{"relevance":3},{"relevance":2},{"relevance":3},{"relevance":0},{"relevance":1},{"relevance":2}]"#,
        );
        assert_eq!(Metric::Ndcg.summary(&path).unwrap(), "NDCG@6 = 0.9488");
    }

    #[test]
    fn empty_inputs_score_zero() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.json", "[]");
        assert_eq!(
            Metric::Precision.summary(&path).unwrap(),
            "Precision@0 = 0.0000 (0/0 relevant)"
        );
        assert_eq!(Metric::Mrr.summary(&path).unwrap(), "MRR = 0.0000 (0.00/0)");
        assert_eq!(Metric::Ndcg.summary(&path).unwrap(), "NDCG@0 = 0.0000");
    }

    #[test]
    fn missing_file_is_fatal_for_that_metric_only() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "mrr_result.json", r#"[{"mrr":1}]"#);
        let missing = dir.path().join("k_precision_result.json");

        let err = Metric::Precision.summary(&missing).unwrap_err();
        assert!(matches!(err, PropevalError::Io(_)));
        assert_eq!(Metric::Mrr.summary(&good).unwrap(), "MRR = 1.0000 (1.00/1)");
    }

    #[test]
    fn malformed_json_surfaces_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ndcg_result.json", "not json");
        assert!(matches!(
            evaluate_ndcg(&path).unwrap_err(),
            PropevalError::Json(_)
        ));
    }

    #[test]
    fn huge_grade_is_rejected_not_reported_as_nan() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ndcg_result.json", r#"[{"relevance":1100},{"relevance":1}]"#);
        let err = Metric::Ndcg.summary(&path).unwrap_err();
        assert!(matches!(err, PropevalError::InvalidInput(_)));
        assert!(err.to_string().contains("ndcg_result.json"));
    }

    #[test]
    fn summed_gain_overflow_is_rejected() {
        // each gain is finite on its own, their sum is not
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ndcg_result.json",
            r#"[{"relevance":1023.9},{"relevance":1023.9},{"relevance":1023.9}]"#,
        );
        assert!(matches!(
            evaluate_ndcg(&path).unwrap_err(),
            PropevalError::InvalidInput(_)
        ));
    }

    #[test]
    fn mrr_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "mrr_result.json", r#"[{"mrr":1},{"mrr":"high"}]"#);
        let err = Metric::Mrr.summary(&path).unwrap_err();
        assert!(err.to_string().contains("mrr_result.json: record 1"));
    }

    #[test]
    fn metric_names() {
        let names: Vec<&str> = Metric::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Precision@K", "MRR", "NDCG@K"]);
    }
}
