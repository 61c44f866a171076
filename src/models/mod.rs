// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateEntry, CandidateProfile, FeedbackAnalytics, FeedbackEntry, FeedbackLabel,
    HiringProfile, MatchResult, MatchStatistics, Recommendation, WeightHistoryRecord,
    WeightParameters,
};
pub use requests::{ComputeMatchRequest, RankCandidatesRequest, RecordFeedbackRequest};
pub use responses::{
    AdjustResponse, AnalyticsResponse, ErrorResponse, FeedbackResponse, HealthResponse,
    RankResponse, WeightHistoryResponse, WeightsResponse,
};
