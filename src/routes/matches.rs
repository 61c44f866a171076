use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::matcher::match_statistics;
use crate::core::{Matcher, MatchError, WeightAdjuster};
use crate::models::{
    ComputeMatchRequest, ErrorResponse, HealthResponse, RankCandidatesRequest, RankResponse,
    WeightParameters,
};
use crate::services::{PostgresClient, WeightStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub weights: Arc<WeightStore>,
    pub matcher: Matcher,
    pub adjuster: Arc<WeightAdjuster>,
    /// Configured first-startup weights, also the reset target.
    pub default_weights: WeightParameters,
}

/// Configure match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/compute", web::post().to(compute_match))
        .route("/matches/rank", web::post().to(rank_candidates));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn match_error_response(err: MatchError) -> HttpResponse {
    match err {
        MatchError::InvalidWeights { .. } => {
            // A broken live pair is a service defect, not a caller error
            tracing::error!(error = %err, "weight store holds invalid weights");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Invalid weight configuration".to_string(),
                message: err.to_string(),
                status_code: 500,
            })
        }
        _ => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid match input".to_string(),
            message: err.to_string(),
            status_code: 400,
        }),
    }
}

/// Compute a single candidate-job match
///
/// POST /api/v1/matches/compute
///
/// Request body:
/// ```json
/// {
///   "candidate_embedding": [0.1, ...],
///   "job_embedding": [0.2, ...],
///   "screening_score": 7.5,
///   "candidate_id": "optional",
///   "hiring_profile_id": "optional"
/// }
/// ```
async fn compute_match(
    state: web::Data<AppState>,
    req: web::Json<ComputeMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for compute_match request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    // Explicit ids win; fall back to the ids carried by the profiles
    let candidate_id = req
        .candidate_id
        .as_deref()
        .or_else(|| req.candidate_profile.as_ref().map(|p| p.candidate_id.as_str()))
        .unwrap_or("");
    let hiring_profile_id = req
        .hiring_profile_id
        .as_deref()
        .or_else(|| req.hiring_profile.as_ref().map(|p| p.hiring_profile_id.as_str()))
        .unwrap_or("");

    match state
        .matcher
        .compute_match(
            &req.job_embedding,
            &req.candidate_embedding,
            req.screening_score,
            candidate_id,
            hiring_profile_id,
            req.candidate_profile.as_ref(),
            req.hiring_profile.as_ref(),
        )
        .await
    {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => match_error_response(e),
    }
}

/// Rank a batch of candidates against one hiring profile
///
/// POST /api/v1/matches/rank
async fn rank_candidates(
    state: web::Data<AppState>,
    req: web::Json<RankCandidatesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    // Cap limit at 100 to prevent excessive payloads
    let limit = req.limit.min(100) as usize;
    let RankCandidatesRequest {
        job_embedding,
        candidates,
        min_score,
        hiring_profile_id,
        hiring_profile,
        ..
    } = req.into_inner();
    let hiring_profile_id = hiring_profile_id
        .or_else(|| hiring_profile.as_ref().map(|p| p.hiring_profile_id.clone()))
        .unwrap_or_default();

    tracing::info!(candidates = candidates.len(), limit, "ranking candidates");

    let outcome = state
        .matcher
        .rank_candidates(
            &job_embedding,
            candidates,
            &hiring_profile_id,
            hiring_profile.as_ref(),
            limit,
        )
        .await;

    let matches = match min_score {
        Some(min_score) => crate::core::matcher::filter_by_threshold(&outcome.matches, min_score),
        None => outcome.matches,
    };

    let statistics = match_statistics(&matches);

    HttpResponse::Ok().json(RankResponse {
        matches,
        total_candidates: outcome.total_candidates,
        skipped: outcome.skipped,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}
