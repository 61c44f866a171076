use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::core::scoring::GOOD_FIT_THRESHOLD;
use crate::models::{FeedbackEntry, FeedbackLabel, WeightParameters};
use crate::services::postgres::{PostgresClient, StoreError};
use crate::services::WeightStore;

/// Recent entries considered per adjustment cycle.
pub const DEFAULT_WINDOW_SIZE: usize = 20;
/// Below this many entries a cycle is a no-op.
pub const DEFAULT_MIN_ENTRIES: usize = 5;
/// Weight mass moved per adjustment.
pub const DEFAULT_STEP: f64 = 0.05;
/// Window accuracy below which weights move.
pub const DEFAULT_TARGET_ACCURACY: f64 = 0.70;
/// New feedback entries between automatic cycles.
pub const DEFAULT_TRIGGER_EVERY: u32 = 5;
/// Smoothing factor for the confidence moving average.
pub const CONFIDENCE_SMOOTHING: f64 = 0.3;

/// Tunables for the adjustment cycle.
#[derive(Debug, Clone)]
pub struct AdjusterConfig {
    pub window_size: usize,
    pub min_entries: usize,
    pub step: f64,
    pub target_accuracy: f64,
    pub trigger_every: u32,
}

impl Default for AdjusterConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_entries: DEFAULT_MIN_ENTRIES,
            step: DEFAULT_STEP,
            target_accuracy: DEFAULT_TARGET_ACCURACY,
            trigger_every: DEFAULT_TRIGGER_EVERY,
        }
    }
}

/// Agreement statistics over one feedback window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub total: usize,
    pub agreements: usize,
    /// `not_fit` labels on scores the combiner called a fit.
    pub false_positives: usize,
    /// `good_fit` labels on scores the combiner called a non-fit.
    pub false_negatives: usize,
    pub accuracy: f64,
}

/// Result of one adjustment cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdjustmentOutcome {
    Adjusted {
        previous: WeightParameters,
        updated: WeightParameters,
        accuracy: f64,
        confidence: f64,
    },
    NoChangeNeeded {
        accuracy: f64,
        confidence: f64,
    },
    InsufficientData {
        entries: usize,
    },
}

/// Partition a feedback window into agreements and disagreements.
///
/// An entry agrees when the tier implied by its recorded final score matches
/// the human label: scores at or above the good-fit threshold imply a fit
/// (`STRONG_FIT`/`GOOD_FIT`), scores below imply a non-fit
/// (`MODERATE_FIT`/`WEAK_FIT`).
pub fn evaluate_window(entries: &[FeedbackEntry]) -> WindowStats {
    let mut agreements = 0usize;
    let mut false_positives = 0usize;
    let mut false_negatives = 0usize;

    for entry in entries {
        let predicted_fit = entry.final_score >= GOOD_FIT_THRESHOLD;
        match (predicted_fit, entry.label) {
            (true, FeedbackLabel::GoodFit) | (false, FeedbackLabel::NotFit) => agreements += 1,
            (true, FeedbackLabel::NotFit) => false_positives += 1,
            (false, FeedbackLabel::GoodFit) => false_negatives += 1,
        }
    }

    let total = entries.len();
    WindowStats {
        total,
        agreements,
        false_positives,
        false_negatives,
        accuracy: if total > 0 {
            agreements as f64 / total as f64
        } else {
            0.0
        },
    }
}

/// Move `step` of weight mass from the dominant signal to the minority one.
///
/// Only the final score and the label are persisted per feedback entry, so
/// per-component correlation cannot be recomputed from the log; the dominant
/// component is the one most responsible for a wrong blended prediction. On
/// an exact tie mass moves toward screening, the human-evaluated signal.
/// Weights are clamped to [0, 1] and renormalized to keep the sum invariant.
pub fn step_weights(current: WeightParameters, step: f64) -> WeightParameters {
    let toward_screening = current.similarity_weight >= current.screening_weight;
    let (delta_similarity, delta_screening) = if toward_screening {
        (-step, step)
    } else {
        (step, -step)
    };

    let similarity = (current.similarity_weight + delta_similarity).clamp(0.0, 1.0);
    let screening = (current.screening_weight + delta_screening).clamp(0.0, 1.0);

    let total = similarity + screening;
    if total == 0.0 {
        return current;
    }

    WeightParameters {
        similarity_weight: similarity / total,
        screening_weight: screening / total,
    }
}

/// Exponential moving average of cycle accuracy.
fn smooth_confidence(previous: f64, accuracy: f64) -> f64 {
    (1.0 - CONFIDENCE_SMOOTHING) * previous + CONFIDENCE_SMOOTHING * accuracy
}

struct CycleTracker {
    pending: u32,
}

/// Periodic weight adjustment driver.
///
/// At most one cycle runs at a time: the tracker mutex is held for the whole
/// read-accuracy-then-write-weights sequence. The cycle is perpetual; a
/// skipped or no-change cycle simply leaves the weights untouched.
pub struct WeightAdjuster {
    postgres: Arc<PostgresClient>,
    weights: Arc<WeightStore>,
    config: AdjusterConfig,
    cycle: Mutex<CycleTracker>,
}

impl WeightAdjuster {
    pub fn new(
        postgres: Arc<PostgresClient>,
        weights: Arc<WeightStore>,
        config: AdjusterConfig,
    ) -> Self {
        Self {
            postgres,
            weights,
            config,
            cycle: Mutex::new(CycleTracker { pending: 0 }),
        }
    }

    /// Note one newly recorded feedback entry; runs a cycle once
    /// `trigger_every` entries have accumulated since the last one.
    pub async fn note_feedback(&self) -> Result<Option<AdjustmentOutcome>, StoreError> {
        let mut cycle = self.cycle.lock().await;
        cycle.pending += 1;

        if cycle.pending < self.config.trigger_every {
            return Ok(None);
        }

        cycle.pending = 0;
        self.run_locked().await.map(Some)
    }

    /// Run one adjustment cycle immediately (operator request).
    pub async fn run_cycle(&self) -> Result<AdjustmentOutcome, StoreError> {
        let mut cycle = self.cycle.lock().await;
        cycle.pending = 0;
        self.run_locked().await
    }

    // Caller must hold the cycle lock.
    async fn run_locked(&self) -> Result<AdjustmentOutcome, StoreError> {
        tracing::debug!(window_size = self.config.window_size, "collecting feedback window");
        let window = self.postgres.recent_feedback(self.config.window_size).await?;

        if window.len() < self.config.min_entries {
            tracing::debug!(
                entries = window.len(),
                min_entries = self.config.min_entries,
                "adjustment cycle skipped"
            );
            return Ok(AdjustmentOutcome::InsufficientData {
                entries: window.len(),
            });
        }

        let stats = evaluate_window(&window);
        let snapshot = self.weights.snapshot().await;
        let confidence = smooth_confidence(snapshot.confidence, stats.accuracy);

        tracing::debug!(
            accuracy = stats.accuracy,
            false_positives = stats.false_positives,
            false_negatives = stats.false_negatives,
            confidence,
            "window evaluated"
        );

        if stats.accuracy >= self.config.target_accuracy {
            self.weights.update_confidence(confidence).await;
            return Ok(AdjustmentOutcome::NoChangeNeeded {
                accuracy: stats.accuracy,
                confidence,
            });
        }

        let updated = step_weights(snapshot.params, self.config.step);
        if updated == snapshot.params {
            self.weights.update_confidence(confidence).await;
            return Ok(AdjustmentOutcome::NoChangeNeeded {
                accuracy: stats.accuracy,
                confidence,
            });
        }

        let shifted_toward = if updated.screening_weight > snapshot.params.screening_weight {
            "screening"
        } else {
            "similarity"
        };
        let trigger = format!(
            "accuracy {:.2} below target {:.2} ({} high-score rejections, {} low-score acceptances); shifted {:.2} toward {}",
            stats.accuracy,
            self.config.target_accuracy,
            stats.false_positives,
            stats.false_negatives,
            self.config.step,
            shifted_toward,
        );

        self.weights
            .set(updated, confidence, stats.accuracy, &trigger, window.len() as i64)
            .await?;

        tracing::info!(
            similarity_weight = updated.similarity_weight,
            screening_weight = updated.screening_weight,
            accuracy = stats.accuracy,
            %trigger,
            "weights adjusted"
        );

        Ok(AdjustmentOutcome::Adjusted {
            previous: snapshot.params,
            updated,
            accuracy: stats.accuracy,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(final_score: f64, label: FeedbackLabel) -> FeedbackEntry {
        FeedbackEntry {
            id: 0,
            candidate_id: "c1".to_string(),
            evaluator_id: "e1".to_string(),
            final_score,
            label,
            notes: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn evaluate_window_partitions_agreements() {
        let entries = vec![
            entry(8.0, FeedbackLabel::GoodFit),  // agree
            entry(3.0, FeedbackLabel::NotFit),   // agree
            entry(9.0, FeedbackLabel::NotFit),   // false positive
            entry(4.0, FeedbackLabel::GoodFit),  // false negative
        ];

        let stats = evaluate_window(&entries);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.agreements, 2);
        assert_eq!(stats.false_positives, 1);
        assert_eq!(stats.false_negatives, 1);
        assert!((stats.accuracy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn evaluate_window_treats_threshold_as_fit() {
        let entries = vec![entry(GOOD_FIT_THRESHOLD, FeedbackLabel::GoodFit)];
        let stats = evaluate_window(&entries);
        assert_eq!(stats.agreements, 1);
    }

    #[test]
    fn evaluate_window_on_empty_input() {
        let stats = evaluate_window(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.accuracy, 0.0);
    }

    #[test]
    fn step_moves_mass_off_the_dominant_signal() {
        let updated = step_weights(WeightParameters::default(), 0.05);
        assert!((updated.similarity_weight - 0.55).abs() < 1e-9);
        assert!((updated.screening_weight - 0.45).abs() < 1e-9);

        let screening_heavy = WeightParameters {
            similarity_weight: 0.3,
            screening_weight: 0.7,
        };
        let updated = step_weights(screening_heavy, 0.05);
        assert!((updated.similarity_weight - 0.35).abs() < 1e-9);
        assert!((updated.screening_weight - 0.65).abs() < 1e-9);
    }

    #[test]
    fn step_on_tie_favors_screening() {
        let tied = WeightParameters {
            similarity_weight: 0.5,
            screening_weight: 0.5,
        };
        let updated = step_weights(tied, 0.05);
        assert!(updated.screening_weight > updated.similarity_weight);
    }

    #[test]
    fn step_clamps_and_keeps_sum_invariant() {
        let extreme = WeightParameters {
            similarity_weight: 0.02,
            screening_weight: 0.98,
        };
        let updated = step_weights(extreme, 0.05);
        assert!(updated.similarity_weight >= 0.0);
        assert!(updated.screening_weight <= 1.0);
        assert!((updated.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_moves_toward_accuracy() {
        let updated = smooth_confidence(0.5, 1.0);
        assert!(updated > 0.5 && updated < 1.0);
        assert!((updated - 0.65).abs() < 1e-9);
    }
}
