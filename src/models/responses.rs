use serde::{Deserialize, Serialize};

use crate::core::AdjustmentOutcome;
use crate::models::domain::{
    FeedbackAnalytics, MatchResult, MatchStatistics, WeightHistoryRecord,
};

/// Response for the batch ranking endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub matches: Vec<MatchResult>,
    pub total_candidates: usize,
    pub skipped: usize,
    pub statistics: MatchStatistics,
}

/// Response after recording feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub accepted: bool,
    pub feedback_id: i64,
    pub current_weights: WeightsResponse,
}

/// Current weights plus the adjuster's confidence in them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsResponse {
    pub similarity_weight: f64,
    pub screening_weight: f64,
    pub confidence: f64,
    pub total_feedback: i64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Weight adjustment audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightHistoryResponse {
    pub records: Vec<WeightHistoryRecord>,
    pub count: usize,
}

/// Outcome of an operator-triggered adjustment cycle.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustResponse {
    #[serde(flatten)]
    pub outcome: AdjustmentOutcome,
}

/// Feedback analytics plus the weights they currently drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    #[serde(flatten)]
    pub analytics: FeedbackAnalytics,
    pub current_weights: WeightsResponse,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
