//! Ranking evaluation: labelled result records, metrics (P@K, MRR, NDCG@K), and summaries.

pub mod metrics;
pub mod records;
pub mod report;

pub use metrics::{
    dcg, ideal_dcg, mean_reciprocal_rank, ndcg_at_k, precision_at_k, MeanReciprocalRank, NdcgAtK,
    PrecisionAtK,
};
pub use report::{evaluate_mrr, evaluate_ndcg, evaluate_precision, Metric};
