//! Classifier port: Trait for the trained-model artifact.
//!
//! This trait hides the artifact's native representation from the rest of
//! the system. The artifact is loaded once at startup and treated as
//! read-only for the process lifetime; implementations must be reentrant so
//! concurrent predictions can share one instance without locking.

/// Opaque class token produced by the artifact (the label decoder maps it
/// back to a human-readable class name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassToken(pub usize);

/// Output of one classification call.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Predicted class token (internal index).
    pub token: ClassToken,
    /// Top-class probability, when the artifact supports confidence
    /// scores. `None` means the orchestrator substitutes its configured
    /// policy default.
    pub probability: Option<f64>,
}

/// Error type for classification operations.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The artifact is not loaded. Surfaced to callers as
    /// service-unavailable; not retryable within the same process.
    #[error("classification model is not loaded")]
    Unavailable,

    /// Unexpected failure inside the classification call itself.
    #[error("classification failed: {0}")]
    Failed(String),
}

/// Trait for trained-model operations.
///
/// Implementations wrap a pre-fitted classification artifact plus an
/// optional label decoder.
pub trait Classifier: Send + Sync {
    /// Classify an encoded feature vector.
    ///
    /// # Errors
    /// Returns [`ClassifierError::Unavailable`] if no artifact is loaded,
    /// or [`ClassifierError::Failed`] on an unexpected artifact failure.
    fn classify(&self, features: &[f64]) -> Result<Classification, ClassifierError>;

    /// Decode a class token to a human-readable class name.
    ///
    /// When no label decoder is available, returns the stringified token.
    fn decode(&self, token: ClassToken) -> String;

    /// Input width the artifact was trained on, when known. The service
    /// cross-checks this against the configured feature layout at startup.
    fn feature_width(&self) -> Option<usize>;

    /// Whether an artifact is loaded and classification can succeed.
    fn is_available(&self) -> bool;

    /// Whether a label decoder is available (false means decoded names
    /// fall back to stringified tokens).
    fn has_decoder(&self) -> bool;
}
