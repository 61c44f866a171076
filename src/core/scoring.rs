use crate::core::MatchError;
use crate::models::{CandidateProfile, HiringProfile, Recommendation, WeightParameters};

/// Final score at or above this is a strong fit.
pub const STRONG_FIT_THRESHOLD: f64 = 8.5;
/// Final score at or above this is a good fit.
pub const GOOD_FIT_THRESHOLD: f64 = 6.5;
/// Final score at or above this is a moderate fit; below is weak.
pub const MODERATE_FIT_THRESHOLD: f64 = 4.0;

/// Tolerance on the weight-sum invariant.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Blend similarity and screening into a final score in [0, 10].
///
/// Scoring formula:
/// ```text
/// final_score = similarity_weight * similarity * 10
///             + screening_weight * screening
/// ```
/// `similarity` is expected in [0, 1] and `screening` in [0, 10]; the
/// similarity term is scaled by 10 so both components share the [0, 10]
/// range before weighting.
///
/// # Errors
/// `InvalidWeights` if the weights are negative or do not sum to 1 within
/// `WEIGHT_SUM_EPSILON`. The combiner never renormalizes on the caller's
/// behalf; a broken pair is a programmer error, not a runtime condition.
pub fn combine_scores(
    similarity: f64,
    screening: f64,
    weights: &WeightParameters,
) -> Result<f64, MatchError> {
    validate_weights(weights)?;

    let final_score =
        weights.similarity_weight * similarity * 10.0 + weights.screening_weight * screening;

    Ok(final_score.clamp(0.0, 10.0))
}

/// Check the weight-sum invariant.
pub fn validate_weights(weights: &WeightParameters) -> Result<(), MatchError> {
    let sum = weights.sum();
    if weights.similarity_weight < 0.0
        || weights.screening_weight < 0.0
        || (sum - 1.0).abs() > WEIGHT_SUM_EPSILON
    {
        return Err(MatchError::InvalidWeights { sum });
    }
    Ok(())
}

/// Derive the recommendation tier from a final score.
pub fn recommendation_for(final_score: f64) -> Recommendation {
    if final_score >= STRONG_FIT_THRESHOLD {
        Recommendation::StrongFit
    } else if final_score >= GOOD_FIT_THRESHOLD {
        Recommendation::GoodFit
    } else if final_score >= MODERATE_FIT_THRESHOLD {
        Recommendation::ModerateFit
    } else {
        Recommendation::WeakFit
    }
}

/// Build the human-readable explanation for a match.
///
/// Component brackets follow the score bands surfaced to recruiters:
/// similarity at 0.9 / 0.7 / 0.5, screening at 8 / 6 / 4.
pub fn describe_match(
    similarity: f64,
    screening: f64,
    candidate: Option<&CandidateProfile>,
    hiring: Option<&HiringProfile>,
) -> String {
    let similarity_pct = similarity * 100.0;

    let similarity_part = if similarity >= 0.9 {
        format!("Strong technical compatibility ({similarity_pct:.0}%)")
    } else if similarity >= 0.7 {
        format!("Good technical fit ({similarity_pct:.0}%)")
    } else if similarity >= 0.5 {
        format!("Moderate technical overlap ({similarity_pct:.0}%)")
    } else {
        format!("Limited technical match ({similarity_pct:.0}%)")
    };

    let screening_part = if screening >= 8.0 {
        format!("Excellent screening performance ({screening:.1}/10)")
    } else if screening >= 6.0 {
        format!("Good screening results ({screening:.1}/10)")
    } else if screening >= 4.0 {
        format!("Acceptable responses ({screening:.1}/10)")
    } else {
        format!("Poor screening performance ({screening:.1}/10)")
    };

    match (candidate, hiring) {
        (Some(candidate), Some(hiring)) => format!(
            "{} for {} against {}. {}.",
            similarity_part, candidate.name, hiring.role_title, screening_part
        ),
        _ => format!("{similarity_part}. {screening_part}."),
    }
}
