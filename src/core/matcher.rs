use std::sync::Arc;

use crate::core::scoring::{
    combine_scores, describe_match, recommendation_for, GOOD_FIT_THRESHOLD,
    MODERATE_FIT_THRESHOLD, STRONG_FIT_THRESHOLD,
};
use crate::core::{cosine_similarity, MatchError};
use crate::models::{
    CandidateEntry, CandidateProfile, HiringProfile, MatchResult, MatchStatistics,
};
use crate::services::WeightStore;

/// Result of ranking a batch of candidates.
#[derive(Debug)]
pub struct RankingOutcome {
    pub matches: Vec<MatchResult>,
    pub total_candidates: usize,
    /// Entries dropped for invalid input (bad embedding or screening score).
    pub skipped: usize,
}

/// Match orchestrator.
///
/// Stateless aside from reading the live blend weights on every request, so a
/// single instance is shared across all handlers.
#[derive(Clone)]
pub struct Matcher {
    weights: Arc<WeightStore>,
}

impl Matcher {
    pub fn new(weights: Arc<WeightStore>) -> Self {
        Self { weights }
    }

    /// Compute the match between one candidate and one hiring profile.
    ///
    /// # Arguments
    /// * `job_embedding` - embedding of the hiring profile
    /// * `candidate_embedding` - embedding of the candidate profile
    /// * `screening_score` - screening evaluation in [0, 10]
    /// * `candidate` / `hiring` - optional profiles used to enrich the
    ///   explanation text
    ///
    /// # Errors
    /// `ScreeningScoreOutOfRange`, `EmptyEmbedding`, `DimensionMismatch`, or
    /// `InvalidWeights` if the weight store holds a broken pair.
    pub async fn compute_match(
        &self,
        job_embedding: &[f32],
        candidate_embedding: &[f32],
        screening_score: f64,
        candidate_id: &str,
        hiring_profile_id: &str,
        candidate: Option<&CandidateProfile>,
        hiring: Option<&HiringProfile>,
    ) -> Result<MatchResult, MatchError> {
        if !(0.0..=10.0).contains(&screening_score) {
            return Err(MatchError::ScreeningScoreOutOfRange(screening_score));
        }

        let similarity_score = cosine_similarity(job_embedding, candidate_embedding)?;

        let weights = self.weights.current().await;
        let final_score = combine_scores(similarity_score, screening_score, &weights)?;
        let recommendation = recommendation_for(final_score);
        let explanation = describe_match(similarity_score, screening_score, candidate, hiring);

        tracing::debug!(
            candidate_id,
            similarity = similarity_score,
            screening = screening_score,
            final_score,
            "match computed"
        );

        Ok(MatchResult {
            candidate_id: candidate_id.to_string(),
            hiring_profile_id: hiring_profile_id.to_string(),
            similarity_score,
            screening_score,
            final_score,
            recommendation,
            explanation: Some(explanation),
        })
    }

    /// Match a batch of candidates against one hiring profile.
    ///
    /// Invalid entries are skipped with a warning rather than aborting the
    /// batch; the count is reported in the outcome. Results are sorted by
    /// final score descending (similarity descending as tie-break) and
    /// truncated to `limit`.
    pub async fn rank_candidates(
        &self,
        job_embedding: &[f32],
        candidates: Vec<CandidateEntry>,
        hiring_profile_id: &str,
        hiring: Option<&HiringProfile>,
        limit: usize,
    ) -> RankingOutcome {
        let total_candidates = candidates.len();
        let mut skipped = 0usize;
        let mut matches = Vec::with_capacity(total_candidates);

        for entry in candidates {
            let result = self
                .compute_match(
                    job_embedding,
                    &entry.embedding,
                    entry.screening_score,
                    &entry.candidate_id,
                    hiring_profile_id,
                    entry.profile.as_ref(),
                    hiring,
                )
                .await;

            match result {
                Ok(matched) => matches.push(matched),
                Err(e) => {
                    tracing::warn!(candidate_id = %entry.candidate_id, error = %e, "skipping candidate");
                    skipped += 1;
                }
            }
        }

        matches.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.similarity_score
                        .partial_cmp(&a.similarity_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });

        matches.truncate(limit);

        RankingOutcome {
            matches,
            total_candidates,
            skipped,
        }
    }
}

/// Keep only matches at or above `min_score`.
pub fn filter_by_threshold(matches: &[MatchResult], min_score: f64) -> Vec<MatchResult> {
    matches
        .iter()
        .filter(|m| m.final_score >= min_score)
        .cloned()
        .collect()
}

/// Best `top_k` matches by final score.
pub fn top_matches(matches: &[MatchResult], top_k: usize) -> Vec<MatchResult> {
    let mut sorted: Vec<MatchResult> = matches.to_vec();
    sorted.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_k);
    sorted
}

/// Aggregate statistics over a set of match results.
pub fn match_statistics(matches: &[MatchResult]) -> MatchStatistics {
    if matches.is_empty() {
        return MatchStatistics {
            total_matches: 0,
            average_score: 0.0,
            max_score: 0.0,
            min_score: 0.0,
            matches_above_good: 0,
            matches_above_moderate: 0,
            strong_fit_percentage: 0.0,
        };
    }

    let scores: Vec<f64> = matches.iter().map(|m| m.final_score).collect();
    let total = scores.len();
    let sum: f64 = scores.iter().sum();
    let max = scores.iter().cloned().fold(f64::MIN, f64::max);
    let min = scores.iter().cloned().fold(f64::MAX, f64::min);
    let strong = scores.iter().filter(|s| **s >= STRONG_FIT_THRESHOLD).count();

    MatchStatistics {
        total_matches: total,
        average_score: sum / total as f64,
        max_score: max,
        min_score: min,
        matches_above_good: scores.iter().filter(|s| **s >= GOOD_FIT_THRESHOLD).count(),
        matches_above_moderate: scores
            .iter()
            .filter(|s| **s >= MODERATE_FIT_THRESHOLD)
            .count(),
        strong_fit_percentage: strong as f64 / total as f64 * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recommendation, WeightParameters};

    fn test_matcher() -> Matcher {
        Matcher::new(Arc::new(WeightStore::detached(WeightParameters::default())))
    }

    fn entry(id: &str, embedding: Vec<f32>, screening: f64) -> CandidateEntry {
        CandidateEntry {
            candidate_id: id.to_string(),
            embedding,
            screening_score: screening,
            profile: None,
        }
    }

    #[tokio::test]
    async fn compute_match_produces_expected_score() {
        let matcher = test_matcher();
        let job = vec![1.0, 0.0];

        let result = matcher
            .compute_match(&job, &job, 8.0, "c1", "h1", None, None)
            .await
            .unwrap();

        // similarity 1.0: 0.6 * 10 + 0.4 * 8 = 9.2
        assert!((result.final_score - 9.2).abs() < 1e-9);
        assert_eq!(result.recommendation, Recommendation::StrongFit);
        assert!(result.explanation.is_some());
    }

    #[tokio::test]
    async fn compute_match_rejects_bad_screening_score() {
        let matcher = test_matcher();
        let job = vec![1.0, 0.0];

        let err = matcher
            .compute_match(&job, &job, 10.5, "c1", "h1", None, None)
            .await
            .unwrap_err();

        assert_eq!(err, MatchError::ScreeningScoreOutOfRange(10.5));
    }

    #[tokio::test]
    async fn rank_candidates_sorts_and_skips() {
        let matcher = test_matcher();
        let job = vec![1.0, 0.0];

        let candidates = vec![
            entry("aligned", vec![1.0, 0.0], 7.0),
            entry("orthogonal", vec![0.0, 1.0], 7.0),
            entry("bad_dims", vec![1.0, 0.0, 0.0], 7.0),
            entry("bad_score", vec![1.0, 0.0], 12.0),
        ];

        let outcome = matcher.rank_candidates(&job, candidates, "h1", None, 10).await;

        assert_eq!(outcome.total_candidates, 4);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.matches[0].candidate_id, "aligned");
        assert!(outcome.matches[0].final_score > outcome.matches[1].final_score);
    }

    #[tokio::test]
    async fn rank_candidates_respects_limit() {
        let matcher = test_matcher();
        let job = vec![1.0, 0.0];

        let candidates: Vec<CandidateEntry> = (0..20)
            .map(|i| entry(&i.to_string(), vec![1.0, i as f32 * 0.1], 5.0))
            .collect();

        let outcome = matcher.rank_candidates(&job, candidates, "h1", None, 5).await;
        assert_eq!(outcome.matches.len(), 5);
        assert_eq!(outcome.total_candidates, 20);
    }

    #[test]
    fn statistics_over_empty_input() {
        let stats = match_statistics(&[]);
        assert_eq!(stats.total_matches, 0);
        assert_eq!(stats.average_score, 0.0);
    }

    #[test]
    fn statistics_and_threshold_helpers() {
        let make = |id: &str, score: f64| MatchResult {
            candidate_id: id.to_string(),
            hiring_profile_id: "h1".to_string(),
            similarity_score: 0.5,
            screening_score: 5.0,
            final_score: score,
            recommendation: recommendation_for(score),
            explanation: None,
        };

        let matches = vec![make("a", 9.0), make("b", 7.0), make("c", 3.0)];

        let stats = match_statistics(&matches);
        assert_eq!(stats.total_matches, 3);
        assert!((stats.average_score - 19.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.max_score, 9.0);
        assert_eq!(stats.min_score, 3.0);
        assert_eq!(stats.matches_above_good, 2);
        assert_eq!(stats.matches_above_moderate, 2);

        let filtered = filter_by_threshold(&matches, 6.5);
        assert_eq!(filtered.len(), 2);

        let top = top_matches(&matches, 1);
        assert_eq!(top[0].candidate_id, "a");
    }
}
