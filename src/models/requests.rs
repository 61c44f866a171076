use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{CandidateEntry, CandidateProfile, HiringProfile};

/// Request to match one candidate against one hiring profile.
///
/// Profiles are optional; when present they enrich the explanation text.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ComputeMatchRequest {
    #[validate(length(min = 1))]
    pub candidate_embedding: Vec<f32>,
    #[validate(length(min = 1))]
    pub job_embedding: Vec<f32>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub screening_score: f64,
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub hiring_profile_id: Option<String>,
    #[serde(default)]
    pub candidate_profile: Option<CandidateProfile>,
    #[serde(default)]
    pub hiring_profile: Option<HiringProfile>,
}

/// Request to rank a batch of candidates against one hiring profile.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankCandidatesRequest {
    #[validate(length(min = 1))]
    pub job_embedding: Vec<f32>,
    #[validate(length(min = 1))]
    pub candidates: Vec<CandidateEntry>,
    #[serde(default = "default_limit")]
    pub limit: u16,
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub hiring_profile_id: Option<String>,
    #[serde(default)]
    pub hiring_profile: Option<HiringProfile>,
}

fn default_limit() -> u16 {
    20
}

/// Request to record a hiring decision.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordFeedbackRequest {
    #[validate(length(min = 1))]
    pub candidate_id: String,
    #[validate(length(min = 1))]
    pub evaluator_id: String,
    #[validate(range(min = 0.0, max = 10.0))]
    pub final_score: f64,
    /// `good_fit` or `not_fit`.
    pub label: String,
    #[serde(default)]
    pub notes: Option<String>,
}
