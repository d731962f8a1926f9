//! Evaluation metrics: Precision@K, Mean Reciprocal Rank (MRR), and NDCG@K.
//!
//! K is always the length of the supplied result set. Callers truncate to their
//! cutoff before scoring; nothing here pads or trims.

/// Precision@K with the counts it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionAtK {
    pub relevant: usize,
    pub k: usize,
    pub precision: f64,
}

/// Mean of precomputed per-query reciprocal ranks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanReciprocalRank {
    pub sum: f64,
    pub count: usize,
    pub mrr: f64,
}

/// NDCG@K with its DCG and ideal DCG components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdcgAtK {
    pub k: usize,
    pub dcg: f64,
    pub idcg: f64,
    pub ndcg: f64,
}

/// Precision at K: proportion of the K supplied results that are relevant.
/// Returns 0.0 for an empty result set.
pub fn precision_at_k(relevance: &[bool]) -> PrecisionAtK {
    let k = relevance.len();
    let relevant = relevance.iter().filter(|&&r| r).count();
    let precision = if k == 0 {
        0.0
    } else {
        relevant as f64 / k as f64
    };
    PrecisionAtK {
        relevant,
        k,
        precision,
    }
}

/// Mean Reciprocal Rank over per-query values that were already reduced to
/// `1/rank_of_first_relevant` (or 0) upstream. Returns 0.0 when empty.
pub fn mean_reciprocal_rank(reciprocal_ranks: &[f64]) -> MeanReciprocalRank {
    let count = reciprocal_ranks.len();
    let sum: f64 = reciprocal_ranks.iter().sum();
    let mrr = if count == 0 { 0.0 } else { sum / count as f64 };
    MeanReciprocalRank { sum, count, mrr }
}

/// Discounted cumulative gain of relevances in the given rank order.
pub fn dcg(relevances: &[f64]) -> f64 {
    relevances
        .iter()
        .enumerate()
        .map(|(idx, &rel)| gain(rel) / discount(idx + 1))
        .sum()
}

/// DCG of the best possible ordering: relevances sorted descending.
pub fn ideal_dcg(relevances: &[f64]) -> f64 {
    let mut ideal = relevances.to_vec();
    ideal.sort_by(|a, b| b.total_cmp(a));
    dcg(&ideal)
}

/// NDCG@K = DCG / IDCG, or 0.0 when every relevance is zero.
pub fn ndcg_at_k(relevances: &[f64]) -> NdcgAtK {
    let dcg = dcg(relevances);
    let idcg = ideal_dcg(relevances);
    let ndcg = if idcg == 0.0 { 0.0 } else { dcg / idcg };
    NdcgAtK {
        k: relevances.len(),
        dcg,
        idcg,
        ndcg,
    }
}

/// Exponential gain: 2^rel - 1.
#[inline]
fn gain(relevance: f64) -> f64 {
    relevance.exp2() - 1.0
}

/// Logarithmic discount for a 1-based rank: log2(rank + 1).
#[inline]
fn discount(rank: usize) -> f64 {
    ((rank + 1) as f64).log2()
}
