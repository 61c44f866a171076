// Core algorithm exports
pub mod adjuster;
pub mod matcher;
pub mod scoring;
pub mod similarity;

pub use adjuster::{AdjusterConfig, AdjustmentOutcome, WeightAdjuster};
pub use matcher::{Matcher, RankingOutcome};
pub use scoring::{combine_scores, recommendation_for, WEIGHT_SUM_EPSILON};
pub use similarity::cosine_similarity;

use thiserror::Error;

/// Input-validation failures of the matching core.
///
/// These indicate a programming or data-quality defect upstream; they are
/// surfaced to the caller immediately and never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("embedding must not be empty")]
    EmptyEmbedding,

    #[error("weights must sum to 1.0, got {sum}")]
    InvalidWeights { sum: f64 },

    #[error("screening score must be between 0 and 10, got {0}")]
    ScreeningScoreOutOfRange(f64),
}
