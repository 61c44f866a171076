use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::scoring::validate_weights;
use crate::models::WeightParameters;
use crate::services::postgres::{PostgresClient, StoreError};

/// Initial confidence before any feedback has been evaluated.
pub const INITIAL_CONFIDENCE: f64 = 0.5;

/// The live weight value plus the adjuster's confidence in it.
#[derive(Debug, Clone, Copy)]
pub struct WeightState {
    pub params: WeightParameters,
    pub confidence: f64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Owner of the single live `WeightParameters` instance.
///
/// Readers (the match path) take the read lock and always observe a
/// consistent pair; writers (the adjuster, operator resets) are serialized by
/// the write lock, held across the mirror write so the persisted record and
/// the live value cannot diverge. On write failure the live value is left
/// untouched and the error surfaces to the caller as retryable.
pub struct WeightStore {
    state: RwLock<WeightState>,
    postgres: Option<Arc<PostgresClient>>,
}

impl WeightStore {
    /// Load the store from the persisted current-weights row, seeding the
    /// configured defaults on first startup.
    pub async fn load(
        postgres: Arc<PostgresClient>,
        defaults: WeightParameters,
    ) -> Result<Self, StoreError> {
        validate_weights(&defaults)?;

        let state = match postgres.load_weights().await? {
            Some(persisted) => {
                tracing::info!(
                    similarity_weight = persisted.params.similarity_weight,
                    screening_weight = persisted.params.screening_weight,
                    "weights restored from store"
                );
                WeightState {
                    params: persisted.params,
                    confidence: persisted.confidence,
                    updated_at: persisted.updated_at,
                }
            }
            None => {
                tracing::info!(
                    similarity_weight = defaults.similarity_weight,
                    screening_weight = defaults.screening_weight,
                    "no persisted weights, seeding defaults"
                );
                postgres
                    .store_weights(&defaults, INITIAL_CONFIDENCE, 0.0, "initial defaults", 0)
                    .await?;
                WeightState {
                    params: defaults,
                    confidence: INITIAL_CONFIDENCE,
                    updated_at: chrono::Utc::now(),
                }
            }
        };

        Ok(Self {
            state: RwLock::new(state),
            postgres: Some(postgres),
        })
    }

    /// In-memory store with no Postgres mirror, for tests and offline
    /// tooling.
    pub fn detached(params: WeightParameters) -> Self {
        Self {
            state: RwLock::new(WeightState {
                params,
                confidence: INITIAL_CONFIDENCE,
                updated_at: chrono::Utc::now(),
            }),
            postgres: None,
        }
    }

    /// Current live weights.
    pub async fn current(&self) -> WeightParameters {
        self.state.read().await.params
    }

    /// Current live weights plus confidence.
    pub async fn snapshot(&self) -> WeightState {
        *self.state.read().await
    }

    /// Atomically replace the live weights, appending a history record.
    ///
    /// # Errors
    /// `InvalidWeights` if the sum invariant is violated; any persistence
    /// error leaves the live value unchanged.
    pub async fn set(
        &self,
        params: WeightParameters,
        confidence: f64,
        accuracy: f64,
        trigger: &str,
        feedback_count: i64,
    ) -> Result<(), StoreError> {
        validate_weights(&params)?;

        let mut state = self.state.write().await;

        if let Some(postgres) = &self.postgres {
            postgres
                .store_weights(&params, confidence, accuracy, trigger, feedback_count)
                .await?;
        }

        *state = WeightState {
            params,
            confidence,
            updated_at: chrono::Utc::now(),
        };

        Ok(())
    }

    /// Update the confidence metric without touching the weights.
    ///
    /// Confidence changes on no-change cycles live in memory only; they are
    /// mirrored the next time the weights themselves are written.
    pub async fn update_confidence(&self, confidence: f64) {
        let mut state = self.state.write().await;
        state.confidence = confidence;
    }

    /// Restore the configured defaults, recording the reset in history.
    pub async fn reset(&self, defaults: WeightParameters) -> Result<WeightState, StoreError> {
        self.set(
            defaults,
            INITIAL_CONFIDENCE,
            0.0,
            "manual reset to defaults",
            0,
        )
        .await?;
        Ok(self.snapshot().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips_exactly() {
        let store = WeightStore::detached(WeightParameters::default());

        let params = WeightParameters {
            similarity_weight: 0.55,
            screening_weight: 0.45,
        };
        store.set(params, 0.8, 0.75, "test", 10).await.unwrap();

        let current = store.current().await;
        // Bit-identical round trip, no epsilon loss
        assert_eq!(current.similarity_weight, 0.55);
        assert_eq!(current.screening_weight, 0.45);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.confidence, 0.8);
    }

    #[tokio::test]
    async fn set_rejects_invalid_pair() {
        let store = WeightStore::detached(WeightParameters::default());

        let bad = WeightParameters {
            similarity_weight: 0.5,
            screening_weight: 0.6,
        };
        let result = store.set(bad, 0.5, 0.5, "test", 0).await;
        assert!(matches!(result, Err(StoreError::InvalidWeights(_))));

        // Live value untouched
        let current = store.current().await;
        assert_eq!(current, WeightParameters::default());
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let store = WeightStore::detached(WeightParameters {
            similarity_weight: 0.3,
            screening_weight: 0.7,
        });

        let state = store.reset(WeightParameters::default()).await.unwrap();
        assert_eq!(state.params, WeightParameters::default());
        assert_eq!(state.confidence, INITIAL_CONFIDENCE);
    }

    #[tokio::test]
    async fn update_confidence_leaves_weights_alone() {
        let store = WeightStore::detached(WeightParameters::default());
        store.update_confidence(0.9).await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.confidence, 0.9);
        assert_eq!(snapshot.params, WeightParameters::default());
    }
}
