use serde::{Deserialize, Serialize};

/// Candidate profile produced by the upstream extraction pipeline.
///
/// Read-only to this service; the embedding is computed by the embedding
/// provider and fixed once attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_id: String,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: Option<f32>,
    pub embedding: Vec<f32>,
}

/// Hiring profile (role requirements) produced upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiringProfile {
    pub hiring_profile_id: String,
    pub role_title: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub embedding: Vec<f32>,
}

/// Recommendation tier derived from the final score.
///
/// Cut points live in `core::scoring` as documented constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongFit,
    GoodFit,
    ModerateFit,
    WeakFit,
}

/// Result of matching one candidate against one hiring profile.
///
/// Created fresh on every match request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_id: String,
    pub hiring_profile_id: String,
    /// Cosine similarity scaled into [0, 1].
    pub similarity_score: f64,
    /// Externally supplied screening evaluation, [0, 10].
    pub screening_score: f64,
    /// Weighted combination, [0, 10].
    pub final_score: f64,
    pub recommendation: Recommendation,
    pub explanation: Option<String>,
}

/// Blend weights for the final score.
///
/// Invariant: both weights non-negative and summing to 1 (within
/// `core::scoring::WEIGHT_SUM_EPSILON`). Exactly one live instance exists per
/// deployment, owned by `services::weights::WeightStore`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightParameters {
    pub similarity_weight: f64,
    pub screening_weight: f64,
}

impl Default for WeightParameters {
    fn default() -> Self {
        Self {
            similarity_weight: 0.6,
            screening_weight: 0.4,
        }
    }
}

impl WeightParameters {
    pub fn sum(&self) -> f64 {
        self.similarity_weight + self.screening_weight
    }
}

/// Human hiring decision for a scored candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "feedback_label", rename_all = "snake_case")]
pub enum FeedbackLabel {
    GoodFit,
    NotFit,
}

impl FeedbackLabel {
    /// Parse the wire representation (`good_fit` / `not_fit`), case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "good_fit" => Some(FeedbackLabel::GoodFit),
            "not_fit" => Some(FeedbackLabel::NotFit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackLabel::GoodFit => "good_fit",
            FeedbackLabel::NotFit => "not_fit",
        }
    }
}

/// One recorded hiring decision. Append-only; immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: i64,
    pub candidate_id: String,
    pub evaluator_id: String,
    /// The final score that was shown when the decision was made.
    pub final_score: f64,
    pub label: FeedbackLabel,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Snapshot of the weights written each time the adjuster changes them.
/// Never deleted; the table is the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightHistoryRecord {
    pub similarity_weight: f64,
    pub screening_weight: f64,
    /// Window accuracy that triggered this change.
    pub accuracy: f64,
    pub confidence: f64,
    pub trigger: String,
    /// Number of feedback entries in the evaluated window.
    pub feedback_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Aggregate view over the feedback log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackAnalytics {
    pub total_feedback: i64,
    pub good_fit_count: i64,
    pub not_fit_count: i64,
    pub good_fit_percentage: f64,
    pub avg_good_fit_score: Option<f64>,
    pub avg_not_fit_score: Option<f64>,
}

/// One candidate submitted to batch ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub candidate_id: String,
    pub embedding: Vec<f32>,
    pub screening_score: f64,
    #[serde(default)]
    pub profile: Option<CandidateProfile>,
}

/// Aggregate statistics over a set of match results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStatistics {
    pub total_matches: usize,
    pub average_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub matches_above_good: usize,
    pub matches_above_moderate: usize,
    pub strong_fit_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let weights = WeightParameters::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert_eq!(weights.similarity_weight, 0.6);
        assert_eq!(weights.screening_weight, 0.4);
    }

    #[test]
    fn feedback_label_parses_wire_values() {
        assert_eq!(FeedbackLabel::parse("good_fit"), Some(FeedbackLabel::GoodFit));
        assert_eq!(FeedbackLabel::parse("NOT_FIT"), Some(FeedbackLabel::NotFit));
        assert_eq!(FeedbackLabel::parse("maybe"), None);
    }

    #[test]
    fn recommendation_serializes_screaming_snake() {
        let json = serde_json::to_string(&Recommendation::StrongFit).unwrap();
        assert_eq!(json, "\"STRONG_FIT\"");
    }
}
