use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AdjustResponse, AnalyticsResponse, ErrorResponse, FeedbackLabel, FeedbackResponse,
    RecordFeedbackRequest, WeightHistoryResponse, WeightsResponse,
};
use crate::routes::matches::AppState;
use crate::services::{NewFeedback, StoreError, WeightState};

/// Configure feedback and weight routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/feedback/record", web::post().to(record_feedback))
        .route("/feedback/analytics", web::get().to(feedback_analytics))
        .route("/weights", web::get().to(get_weights))
        .route("/weights/history", web::get().to(weight_history))
        .route("/weights/adjust", web::post().to(adjust_weights))
        .route("/weights/reset", web::post().to(reset_weights));
}

fn store_error_response(err: StoreError) -> HttpResponse {
    match err {
        StoreError::Validation(_) | StoreError::InvalidWeights(_) => {
            HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: err.to_string(),
                status_code: 400,
            })
        }
        _ => HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Storage failure, please retry".to_string(),
            message: err.to_string(),
            status_code: 500,
        }),
    }
}

async fn weights_response(state: &AppState, snapshot: WeightState) -> WeightsResponse {
    let total_feedback = state.postgres.feedback_count().await.unwrap_or(0);

    WeightsResponse {
        similarity_weight: snapshot.params.similarity_weight,
        screening_weight: snapshot.params.screening_weight,
        confidence: snapshot.confidence,
        total_feedback,
        updated_at: snapshot.updated_at,
    }
}

/// Record a hiring decision
///
/// POST /api/v1/feedback/record
///
/// Request body:
/// ```json
/// {
///   "candidate_id": "string",
///   "evaluator_id": "string",
///   "final_score": 7.2,
///   "label": "good_fit|not_fit",
///   "notes": "optional"
/// }
/// ```
async fn record_feedback(
    state: web::Data<AppState>,
    req: web::Json<RecordFeedbackRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let label = match FeedbackLabel::parse(&req.label) {
        Some(label) => label,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid label".to_string(),
                message: "Label must be one of: good_fit, not_fit".to_string(),
                status_code: 400,
            });
        }
    };

    let feedback = NewFeedback {
        candidate_id: &req.candidate_id,
        evaluator_id: &req.evaluator_id,
        final_score: req.final_score,
        label,
        notes: req.notes.as_deref(),
    };

    let feedback_id = match state.postgres.record_feedback(&feedback).await {
        Ok(id) => id,
        Err(e) => return store_error_response(e),
    };

    // Adjustment is best-effort; a failed cycle never fails the request
    match state.adjuster.note_feedback().await {
        Ok(Some(outcome)) => tracing::debug!(?outcome, "adjustment cycle ran"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "feedback recorded but adjustment cycle failed"),
    }

    let snapshot = state.weights.snapshot().await;
    let current_weights = weights_response(&state, snapshot).await;

    HttpResponse::Ok().json(FeedbackResponse {
        accepted: true,
        feedback_id,
        current_weights,
    })
}

/// Feedback analytics
///
/// GET /api/v1/feedback/analytics
async fn feedback_analytics(state: web::Data<AppState>) -> impl Responder {
    let analytics = match state.postgres.feedback_analytics().await {
        Ok(analytics) => analytics,
        Err(e) => {
            tracing::error!("Failed to fetch feedback analytics: {}", e);
            return store_error_response(e);
        }
    };

    let snapshot = state.weights.snapshot().await;
    let current_weights = weights_response(&state, snapshot).await;

    HttpResponse::Ok().json(AnalyticsResponse {
        analytics,
        current_weights,
    })
}

/// Current blend weights
///
/// GET /api/v1/weights
async fn get_weights(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.weights.snapshot().await;
    let response = weights_response(&state, snapshot).await;
    HttpResponse::Ok().json(response)
}

/// Weight adjustment history, newest first
///
/// GET /api/v1/weights/history?limit=20
async fn weight_history(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let limit = query
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(20)
        .min(200);

    match state.postgres.weight_history(limit).await {
        Ok(records) => {
            let count = records.len();
            HttpResponse::Ok().json(WeightHistoryResponse { records, count })
        }
        Err(e) => {
            tracing::error!("Failed to fetch weight history: {}", e);
            store_error_response(e)
        }
    }
}

/// Run one adjustment cycle immediately
///
/// POST /api/v1/weights/adjust
async fn adjust_weights(state: web::Data<AppState>) -> impl Responder {
    match state.adjuster.run_cycle().await {
        Ok(outcome) => HttpResponse::Ok().json(AdjustResponse { outcome }),
        Err(e) => {
            tracing::error!("Adjustment cycle failed: {}", e);
            store_error_response(e)
        }
    }
}

/// Reset weights to configured defaults
///
/// POST /api/v1/weights/reset
async fn reset_weights(state: web::Data<AppState>) -> impl Responder {
    match state.weights.reset(state.default_weights).await {
        Ok(snapshot) => {
            let response = weights_response(&state, snapshot).await;
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            tracing::error!("Failed to reset weights: {}", e);
            store_error_response(e)
        }
    }
}
