use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::core::MatchError;
use crate::models::{
    FeedbackAnalytics, FeedbackEntry, FeedbackLabel, WeightHistoryRecord, WeightParameters,
};

/// Errors that can occur when interacting with PostgreSQL.
///
/// `Validation` and `InvalidWeights` are caller-input defects and map to 400
/// at the HTTP boundary; everything else is a retryable persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    InvalidWeights(#[from] MatchError),
}

/// A new feedback entry, before it has been assigned an id.
#[derive(Debug, Clone)]
pub struct NewFeedback<'a> {
    pub candidate_id: &'a str,
    pub evaluator_id: &'a str,
    pub final_score: f64,
    pub label: FeedbackLabel,
    pub notes: Option<&'a str>,
}

/// Current weights as persisted across restarts.
#[derive(Debug, Clone)]
pub struct PersistedWeights {
    pub params: WeightParameters,
    pub confidence: f64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// PostgreSQL client for the feedback log and the weight records.
///
/// The feedback and weight-history tables are append-only; the
/// current-weights table holds a single row mirroring the live value held in
/// `WeightStore`.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string.
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings.
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Append a feedback entry. The insert is awaited and durable before the
    /// call returns; identical payloads produce distinct rows.
    ///
    /// # Errors
    /// `Validation` if the final score is outside [0, 10] (boundaries
    /// inclusive) or either identifier is blank.
    pub async fn record_feedback(&self, feedback: &NewFeedback<'_>) -> Result<i64, StoreError> {
        if !(0.0..=10.0).contains(&feedback.final_score) {
            return Err(StoreError::Validation(format!(
                "final_score must be between 0 and 10, got {}",
                feedback.final_score
            )));
        }
        if feedback.candidate_id.trim().is_empty() {
            return Err(StoreError::Validation("candidate_id is required".to_string()));
        }
        if feedback.evaluator_id.trim().is_empty() {
            return Err(StoreError::Validation("evaluator_id is required".to_string()));
        }

        let query = r#"
            INSERT INTO feedback (candidate_id, evaluator_id, final_score, label, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        "#;

        let row = sqlx::query(query)
            .bind(feedback.candidate_id)
            .bind(feedback.evaluator_id)
            .bind(feedback.final_score)
            .bind(feedback.label)
            .bind(feedback.notes)
            .fetch_one(&self.pool)
            .await?;

        let id: i64 = row.get("id");

        tracing::info!(
            candidate_id = feedback.candidate_id,
            label = feedback.label.as_str(),
            feedback_id = id,
            "feedback recorded"
        );

        Ok(id)
    }

    /// Most recent feedback entries, newest first.
    pub async fn recent_feedback(&self, limit: usize) -> Result<Vec<FeedbackEntry>, StoreError> {
        let query = r#"
            SELECT id, candidate_id, evaluator_id, final_score, label, notes, created_at
            FROM feedback
            ORDER BY created_at DESC, id DESC
            LIMIT $1
        "#;

        let rows = sqlx::query(query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let entries = rows
            .iter()
            .map(|row| FeedbackEntry {
                id: row.get("id"),
                candidate_id: row.get("candidate_id"),
                evaluator_id: row.get("evaluator_id"),
                final_score: row.get("final_score"),
                label: row.get("label"),
                notes: row.get("notes"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(entries)
    }

    /// Total number of feedback entries.
    pub async fn feedback_count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM feedback")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Aggregate statistics over the feedback log.
    pub async fn feedback_analytics(&self) -> Result<FeedbackAnalytics, StoreError> {
        let query = r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE label = 'good_fit') AS good_fit_count,
                COUNT(*) FILTER (WHERE label = 'not_fit') AS not_fit_count,
                AVG(final_score) FILTER (WHERE label = 'good_fit') AS avg_good_fit_score,
                AVG(final_score) FILTER (WHERE label = 'not_fit') AS avg_not_fit_score
            FROM feedback
        "#;

        let row = sqlx::query(query).fetch_one(&self.pool).await?;

        let total: i64 = row.get("total");
        let good_fit_count: i64 = row.get("good_fit_count");

        Ok(FeedbackAnalytics {
            total_feedback: total,
            good_fit_count,
            not_fit_count: row.get("not_fit_count"),
            good_fit_percentage: if total > 0 {
                good_fit_count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            avg_good_fit_score: row.get("avg_good_fit_score"),
            avg_not_fit_score: row.get("avg_not_fit_score"),
        })
    }

    /// Load the persisted current weights, if any exist.
    pub async fn load_weights(&self) -> Result<Option<PersistedWeights>, StoreError> {
        let query = r#"
            SELECT similarity_weight, screening_weight, confidence, updated_at
            FROM current_weights
            WHERE id = TRUE
        "#;

        let row = sqlx::query(query).fetch_optional(&self.pool).await?;

        Ok(row.map(|row| PersistedWeights {
            params: WeightParameters {
                similarity_weight: row.get("similarity_weight"),
                screening_weight: row.get("screening_weight"),
            },
            confidence: row.get("confidence"),
            updated_at: row.get("updated_at"),
        }))
    }

    /// Persist new weights: upsert the current-weights row and append a
    /// history record in one transaction.
    pub async fn store_weights(
        &self,
        params: &WeightParameters,
        confidence: f64,
        accuracy: f64,
        trigger: &str,
        feedback_count: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO current_weights (id, similarity_weight, screening_weight, confidence, updated_at)
            VALUES (TRUE, $1, $2, $3, NOW())
            ON CONFLICT (id)
            DO UPDATE SET
                similarity_weight = EXCLUDED.similarity_weight,
                screening_weight = EXCLUDED.screening_weight,
                confidence = EXCLUDED.confidence,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(params.similarity_weight)
        .bind(params.screening_weight)
        .bind(confidence)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO weight_history (similarity_weight, screening_weight, accuracy, confidence, trigger_action, feedback_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(params.similarity_weight)
        .bind(params.screening_weight)
        .bind(accuracy)
        .bind(confidence)
        .bind(trigger)
        .bind(feedback_count)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            similarity_weight = params.similarity_weight,
            screening_weight = params.screening_weight,
            confidence,
            trigger,
            "weights persisted"
        );

        Ok(())
    }

    /// Weight adjustment history, newest first.
    pub async fn weight_history(
        &self,
        limit: usize,
    ) -> Result<Vec<WeightHistoryRecord>, StoreError> {
        let query = r#"
            SELECT similarity_weight, screening_weight, accuracy, confidence, trigger_action, feedback_count, created_at
            FROM weight_history
            ORDER BY created_at DESC, id DESC
            LIMIT $1
        "#;

        let rows = sqlx::query(query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(|row| WeightHistoryRecord {
                similarity_weight: row.get("similarity_weight"),
                screening_weight: row.get("screening_weight"),
                accuracy: row.get("accuracy"),
                confidence: row.get("confidence"),
                trigger: row.get("trigger_action"),
                feedback_count: row.get("feedback_count"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(records)
    }

    /// Health check for the database connection.
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
