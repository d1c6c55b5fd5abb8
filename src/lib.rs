//! # Habitus
//!
//! Feature-encoding and prediction core for obesity-category classification.
//!
//! This crate provides:
//! - Normalization of loosely-typed, case-insensitive user payloads
//! - Deterministic encoding into the fixed-width feature vector a
//!   pre-trained random-forest classifier expects
//! - Risk-tier and recommendation mapping for the decoded class label
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (feature contract, encoder, risk mapping)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (JSON-exported forest artifact)
//! - `application`: Use cases orchestrating domain and ports
//!
//! The pipeline per request:
//!
//! ```text
//! RawInput -> normalize -> encode (vector + BMI) -> classify -> decode
//!          -> risk + recommendations -> PredictionResult
//! ```
//!
//! The external web/API layer converts wire requests into a [`RawInput`],
//! calls [`application::PredictionService::predict`], and maps
//! [`PredictError`] onto transport status codes via
//! [`PredictError::is_client_error`].

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::{ConfidencePolicy, ModelStatus, PredictionService, PredictorConfig};
pub use domain::{
    EncodedFeatures, FeatureSpec, FittedScaler, NormalizedInput, PredictionResult, RawInput,
    RawValue, RiskLevel,
};

/// Result type for Habitus operations
pub type Result<T> = std::result::Result<T, PredictError>;

/// Main error type for the prediction pipeline.
///
/// Client errors (`is_client_error() == true`) mean the caller must fix the
/// input and resubmit; server errors indicate missing or drifted model
/// assets and are surfaced without retry.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("missing required feature: {0}")]
    MissingFeature(String),

    #[error("feature {field} out of range: {value} (allowed {min} to {max})")]
    InvalidRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown category for {field}: {value:?}")]
    UnknownCategory { field: String, value: String },

    #[error("feature width mismatch: expected {expected}, got {actual}")]
    FeatureWidthMismatch { expected: usize, actual: usize },

    #[error("classification model is not available")]
    ModelUnavailable,

    #[error("classifier failure: {0}")]
    Classifier(String),

    #[error("model artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),
}

impl PredictError {
    /// Whether the error is attributable to the request rather than the
    /// service. The web layer maps client errors to 4xx responses and
    /// everything else to 5xx (503 for [`PredictError::ModelUnavailable`]).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFeature(_) | Self::InvalidRange { .. } | Self::UnknownCategory { .. }
        )
    }
}

impl From<ports::ClassifierError> for PredictError {
    fn from(err: ports::ClassifierError) -> Self {
        match err {
            ports::ClassifierError::Unavailable => Self::ModelUnavailable,
            ports::ClassifierError::Failed(msg) => Self::Classifier(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(PredictError::MissingFeature("weight".into()).is_client_error());
        assert!(PredictError::UnknownCategory {
            field: "caec".into(),
            value: "InvalidValue".into(),
        }
        .is_client_error());
        assert!(!PredictError::ModelUnavailable.is_client_error());
        assert!(!PredictError::FeatureWidthMismatch {
            expected: 31,
            actual: 30,
        }
        .is_client_error());
    }

    #[test]
    fn test_classifier_error_conversion() {
        let err: PredictError = ports::ClassifierError::Unavailable.into();
        assert!(matches!(err, PredictError::ModelUnavailable));

        let err: PredictError = ports::ClassifierError::Failed("boom".into()).into();
        assert!(matches!(err, PredictError::Classifier(_)));
    }
}
