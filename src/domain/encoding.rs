//! Feature encoder: normalized input to fixed-width numeric vector + BMI.
//!
//! Column order is fixed: scaled numericals, raw numericals, then one
//! one-hot block per categorical field in layout order. Every one-hot block
//! emits one column per vocabulary entry regardless of the requested value,
//! so the width never varies with input.
//!
//! BMI is always computed from the raw, unscaled height/weight: the scaler
//! transform must never leak into the BMI calculation.

use serde::{Deserialize, Serialize};

use crate::domain::contract::NormalizedInput;
use crate::domain::spec::FeatureSpec;
use crate::{PredictError, Result};

/// A standard scaler fitted jointly over the scaled numerical fields at
/// training time: `x' = (x - mean) / scale` per position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FittedScaler {
    /// Transform an ordered tuple of raw values.
    ///
    /// The tuple length must match the fitted dimensionality; the transform
    /// applies to the whole tuple at once because it was fitted jointly.
    ///
    /// # Errors
    /// Returns `FeatureWidthMismatch` if the tuple length differs from the
    /// fitted dimensionality.
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.mean.len() || self.mean.len() != self.scale.len() {
            return Err(PredictError::FeatureWidthMismatch {
                expected: self.mean.len(),
                actual: values.len(),
            });
        }

        Ok(values
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| {
                if *scale == 0.0 {
                    // Zero-variance column: center only, matching the
                    // training library's behavior.
                    x - mean
                } else {
                    (x - mean) / scale
                }
            })
            .collect())
    }
}

/// Encoded request: the fixed-width vector plus the derived BMI.
///
/// Built fresh per request and never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures {
    /// Feature values in layout concatenation order.
    pub values: Vec<f64>,
    /// Body mass index from the raw height/weight, in kg/m².
    pub bmi: f64,
}

/// Encoder over a fixed [`FeatureSpec`] and an optional fitted scaler.
///
/// When no scaler is available, the scaled numerical fields pass through
/// unscaled. That is a degraded mode reported via the service status, not a
/// per-request error.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    spec: FeatureSpec,
    scaler: Option<FittedScaler>,
}

impl FeatureEncoder {
    /// Create an encoder for the given layout.
    ///
    /// # Errors
    /// Returns `FeatureWidthMismatch` if the layout fails validation, or if
    /// the scaler's dimensionality differs from the scaled-field count.
    pub fn new(spec: FeatureSpec, scaler: Option<FittedScaler>) -> Result<Self> {
        spec.validate()?;

        if let Some(s) = &scaler {
            if s.mean.len() != spec.scaled_numerical_fields.len()
                || s.scale.len() != spec.scaled_numerical_fields.len()
            {
                return Err(PredictError::FeatureWidthMismatch {
                    expected: spec.scaled_numerical_fields.len(),
                    actual: s.mean.len(),
                });
            }
        }

        Ok(Self { spec, scaler })
    }

    /// Whether a fitted scaler is configured (false means degraded mode).
    #[must_use]
    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// The layout this encoder produces.
    #[must_use]
    pub fn spec(&self) -> &FeatureSpec {
        &self.spec
    }

    /// Encode a normalized input into the fixed-width vector and BMI.
    ///
    /// # Errors
    /// - `MissingFeature` if a configured field has no value (contract drift)
    /// - `UnknownCategory` if a categorical value is not in the vocabulary
    /// - `FeatureWidthMismatch` if the produced width differs from the
    ///   configured width (configuration bug, not a bad request)
    pub fn encode(&self, input: &NormalizedInput) -> Result<EncodedFeatures> {
        let mut values: Vec<f64> = Vec::with_capacity(self.spec.total_width());

        // Scaled numerical block: extract raw, keep a copy for BMI, then
        // run the whole tuple through the scaler at once.
        let mut scaled_raw: Vec<f64> = Vec::with_capacity(self.spec.scaled_numerical_fields.len());
        for field in &self.spec.scaled_numerical_fields {
            let value = input
                .numeric(field)
                .ok_or_else(|| PredictError::MissingFeature((*field).to_string()))?;
            scaled_raw.push(value);
        }

        let bmi = bmi_from_raw(input.weight, input.height)?;

        match &self.scaler {
            Some(scaler) => values.extend(scaler.transform(&scaled_raw)?),
            None => values.extend_from_slice(&scaled_raw),
        }

        // Raw numerical block, unscaled.
        for field in &self.spec.raw_numerical_fields {
            let value = input
                .numeric(field)
                .ok_or_else(|| PredictError::MissingFeature((*field).to_string()))?;
            values.push(value);
        }

        // One-hot blocks, one column per vocabulary entry in fixed order.
        for field in &self.spec.categorical_fields {
            let raw_value = input
                .category(field)
                .ok_or_else(|| PredictError::MissingFeature((*field).to_string()))?;
            let value = if *field == "gender" {
                // Gender historically arrives in any casing; fold to
                // Title-case so "male"/"MALE"/"Male" match one entry.
                title_case(raw_value)
            } else {
                raw_value.to_string()
            };

            let vocabulary = self.spec.vocabulary(field).ok_or_else(|| {
                PredictError::FeatureWidthMismatch {
                    expected: self.spec.expected_width,
                    actual: self.spec.total_width(),
                }
            })?;

            let position = vocabulary.iter().position(|v| *v == value).ok_or_else(|| {
                PredictError::UnknownCategory {
                    field: (*field).to_string(),
                    value,
                }
            })?;

            for i in 0..vocabulary.len() {
                values.push(if i == position { 1.0 } else { 0.0 });
            }
        }

        if values.len() != self.spec.expected_width {
            return Err(PredictError::FeatureWidthMismatch {
                expected: self.spec.expected_width,
                actual: values.len(),
            });
        }

        Ok(EncodedFeatures { values, bmi })
    }
}

/// BMI from raw weight (kg) and height (cm).
///
/// The contract rejects non-positive heights before this runs; the guard
/// here keeps the invariant local.
fn bmi_from_raw(weight_kg: f64, height_cm: f64) -> Result<f64> {
    if height_cm <= 0.0 {
        return Err(PredictError::InvalidRange {
            field: "height".to_string(),
            value: height_cm,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    let height_m = height_cm / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

/// First character uppercased, rest lowercased.
fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
