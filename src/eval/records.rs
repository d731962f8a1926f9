//! Result records: loading labelled JSON files and reading their relevance fields.
//!
//! Every evaluation input is a JSON array of objects whose order is the ranking
//! under test. Absent or `null` fields default to "not relevant"; only structural
//! problems and out-of-domain values are errors.

use crate::error::{PropevalError, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Field holding a binary flag (Precision@K) or a graded score (NDCG@K).
pub const RELEVANCE_FIELD: &str = "relevance";
/// Field holding a precomputed per-query reciprocal rank.
pub const MRR_FIELD: &str = "mrr";

/// One labelled record, in the rank position it was supplied at.
pub type Record = Map<String, Value>;

/// Read a JSON array of objects from disk.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let content = std::fs::read_to_string(path)?;
    parse_records(&content, &path.display().to_string())
}

/// Parse a JSON array of objects. `source` only names the input in error messages.
pub fn parse_records(content: &str, source: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(content)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(PropevalError::Parse(format!(
                "{}: expected a JSON array of records, found {}",
                source,
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(PropevalError::Parse(format!(
                "{}: record {} must be an object, found {}",
                source,
                idx,
                json_kind(&other)
            ))),
        })
        .collect()
}

/// Binary relevance flags in rank order.
pub fn binary_relevance(records: &[Record]) -> Vec<bool> {
    records
        .iter()
        .map(|r| r.get(RELEVANCE_FIELD).map(is_truthy).unwrap_or(false))
        .collect()
}

/// Per-query reciprocal-rank values. Each must lie in [0, 1].
/// `source` only names the input in error messages.
pub fn reciprocal_ranks(records: &[Record], source: &str) -> Result<Vec<f64>> {
    records
        .iter()
        .enumerate()
        .map(|(idx, r)| match r.get(MRR_FIELD) {
            None | Some(Value::Null) => Ok(0.0),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if (0.0..=1.0).contains(&v) => Ok(v),
                _ => Err(PropevalError::Parse(format!(
                    "{}: record {}: {} must be within [0, 1], got {}",
                    source, idx, MRR_FIELD, n
                ))),
            },
            Some(other) => Err(PropevalError::Parse(format!(
                "{}: record {}: {} must be a number, found {}",
                source,
                idx,
                MRR_FIELD,
                json_kind(other)
            ))),
        })
        .collect()
}

/// Graded relevance scores in rank order. Booleans count as 0/1.
///
/// A grade whose gain `2^rel - 1` is not representable as a finite `f64`
/// is rejected rather than scored.
pub fn graded_relevance(records: &[Record], source: &str) -> Result<Vec<f64>> {
    records
        .iter()
        .enumerate()
        .map(|(idx, r)| match r.get(RELEVANCE_FIELD) {
            None | Some(Value::Null) => Ok(0.0),
            Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() && v >= 0.0 => {
                    if v.exp2().is_finite() {
                        Ok(v)
                    } else {
                        Err(PropevalError::InvalidInput(format!(
                            "{}: record {}: graded {} {} is too large, its gain overflows",
                            source, idx, RELEVANCE_FIELD, n
                        )))
                    }
                }
                _ => Err(PropevalError::Parse(format!(
                    "{}: record {}: graded {} must be a non-negative number, got {}",
                    source, idx, RELEVANCE_FIELD, n
                ))),
            },
            Some(other) => Err(PropevalError::Parse(format!(
                "{}: record {}: graded {} must be a number, found {}",
                source,
                idx,
                RELEVANCE_FIELD,
                json_kind(other)
            ))),
        })
        .collect()
}

/// Truthiness of a relevance flag: false, null, 0, "", [] and {} are not relevant.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
