// Service exports
pub mod postgres;
pub mod weights;

pub use postgres::{NewFeedback, PersistedWeights, PostgresClient, StoreError};
pub use weights::{WeightState, WeightStore, INITIAL_CONFIDENCE};
