//! Application layer: Use cases orchestrating domain and ports.

mod predictor;

pub use predictor::{ConfidencePolicy, ModelStatus, PredictionService, PredictorConfig};
