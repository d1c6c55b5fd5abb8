//! Prediction service: Orchestrates the per-request pipeline.
//!
//! This service composes the feature contract, encoder, classifier port,
//! and risk mapper into one `predict` call. It is the only interface the
//! external web layer consumes.
//!
//! The service holds the classifier behind an `Arc` and is constructed
//! explicitly at startup (dependency injection, no global singleton); the
//! pipeline itself is a single-pass, synchronous, stateless function of its
//! input, so one service instance can serve concurrent requests.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::contract::{normalize, RawInput};
use crate::domain::encoding::{FeatureEncoder, FittedScaler};
use crate::domain::outcome::PredictionResult;
use crate::domain::risk;
use crate::domain::spec::FeatureSpec;
use crate::ports::Classifier;
use crate::{PredictError, Result};

/// Policy for the probability substituted when the artifact reports no
/// confidence signal.
///
/// The legacy pipeline silently assumed full confidence; that behavior is
/// available only by opting into [`ConfidencePolicy::AssumeCertain`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfidencePolicy {
    /// Substitute 1.0 (legacy behavior).
    AssumeCertain,
    /// Substitute a fixed value in [0, 1].
    Fixed(f64),
}

impl ConfidencePolicy {
    fn value(self) -> f64 {
        match self {
            Self::AssumeCertain => 1.0,
            Self::Fixed(v) => v.clamp(0.0, 1.0),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorConfig {
    /// Substitution policy for a missing probability signal.
    pub confidence_policy: ConfidencePolicy,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            confidence_policy: ConfidencePolicy::Fixed(0.5),
        }
    }
}

/// Health/status report for the loaded pipeline, serialized by the web
/// layer's model-status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub classifier_loaded: bool,
    pub scaler_loaded: bool,
    pub decoder_loaded: bool,
    /// True when predictions run with unscaled numeric fields.
    pub degraded_unscaled: bool,
    pub expected_width: usize,
    pub scaled_numerical_fields: Vec<&'static str>,
    pub raw_numerical_fields: Vec<&'static str>,
    pub categorical_fields: Vec<&'static str>,
}

/// Service for running obesity-category predictions.
pub struct PredictionService<C: Classifier> {
    classifier: Arc<C>,
    encoder: FeatureEncoder,
    config: PredictorConfig,
}

impl<C: Classifier> std::fmt::Debug for PredictionService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService").finish_non_exhaustive()
    }
}

impl<C: Classifier> PredictionService<C> {
    /// Create a new prediction service.
    ///
    /// Validates the feature layout and cross-checks it against the width
    /// the loaded artifact was trained on. A mismatch is a fatal
    /// configuration error: it must stop startup, not surface per request.
    ///
    /// # Errors
    /// Returns `FeatureWidthMismatch` on layout/artifact drift.
    pub fn new(
        classifier: Arc<C>,
        scaler: Option<FittedScaler>,
        spec: FeatureSpec,
        config: PredictorConfig,
    ) -> Result<Self> {
        let encoder = FeatureEncoder::new(spec, scaler)?;

        if let Some(width) = classifier.feature_width() {
            if width != encoder.spec().expected_width {
                return Err(PredictError::FeatureWidthMismatch {
                    expected: encoder.spec().expected_width,
                    actual: width,
                });
            }
        }

        if !encoder.has_scaler() {
            tracing::warn!("No fitted scaler loaded; predictions run in degraded unscaled mode");
        }

        Ok(Self {
            classifier,
            encoder,
            config,
        })
    }

    /// Run the full prediction pipeline on a raw input mapping.
    ///
    /// Single-pass and stateless; identical input against an unchanged
    /// artifact yields an identical result (modulo the record id and
    /// timestamp).
    ///
    /// # Errors
    /// - `MissingFeature` / `InvalidRange` / `UnknownCategory` — client
    ///   errors; the caller must resubmit corrected input
    /// - `FeatureWidthMismatch` — configuration drift, alert operators
    /// - `ModelUnavailable` — artifact not loaded (service-unavailable)
    /// - `Classifier` — unexpected artifact failure, cause preserved
    pub fn predict(&self, raw: &RawInput) -> Result<PredictionResult> {
        let input = normalize(raw)?;
        tracing::debug!("Normalized input: {input:?}");

        let encoded = self.encoder.encode(&input)?;
        tracing::debug!(
            "Encoded {} features, bmi={:.2}",
            encoded.values.len(),
            encoded.bmi
        );

        let classification = self.classifier.classify(&encoded.values)?;
        let label = self.classifier.decode(classification.token);

        let probability = classification
            .probability
            .unwrap_or_else(|| self.config.confidence_policy.value());
        let confidence = probability;

        let risk_level = risk::risk_for_class(&label);
        let recommendations = risk::recommendations(encoded.bmi, &input);

        let result = PredictionResult::new(
            label,
            probability,
            confidence,
            encoded.bmi,
            risk_level,
            recommendations,
        );

        tracing::info!(
            "Prediction complete: class={}, probability={:.3}, bmi={:.2}, risk={}",
            result.predicted_class,
            result.probability,
            result.bmi,
            result.risk_level
        );

        Ok(result)
    }

    /// Report which assets are loaded and the configured feature layout.
    #[must_use]
    pub fn status(&self) -> ModelStatus {
        let spec = self.encoder.spec();
        ModelStatus {
            classifier_loaded: self.classifier.is_available(),
            scaler_loaded: self.encoder.has_scaler(),
            decoder_loaded: self.classifier.has_decoder(),
            degraded_unscaled: !self.encoder.has_scaler(),
            expected_width: spec.expected_width,
            scaled_numerical_fields: spec.scaled_numerical_fields.clone(),
            raw_numerical_fields: spec.raw_numerical_fields.clone(),
            categorical_fields: spec.categorical_fields.clone(),
        }
    }
}
