//! Static feature layout the classifier was trained against.
//!
//! The one-hot vocabularies are hard-coded and versioned here rather than
//! derived from values observed at request time: every legal value of every
//! categorical field is enumerated so the encoded width is stable no matter
//! which categories a request happens to contain. The total width is
//! validated against the artifact at startup, never per request.

use crate::{PredictError, Result};

/// Expected feature-vector width for the current classifier generation.
pub const EXPECTED_WIDTH: usize = 31;

/// Ordered feature layout: scaled numericals, raw numericals, then one
/// one-hot block per categorical field.
///
/// Read-only after construction; shared process-wide by the service.
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    /// Numeric fields passed through the fitted scaler, in training order.
    pub scaled_numerical_fields: Vec<&'static str>,
    /// Numeric frequency/count fields used unscaled, in training order.
    pub raw_numerical_fields: Vec<&'static str>,
    /// Categorical fields, in training order.
    pub categorical_fields: Vec<&'static str>,
    /// Complete fixed vocabulary per categorical field, in one-hot column
    /// order (lexicographic, matching the training export).
    pub categorical_vocabulary: Vec<(&'static str, Vec<&'static str>)>,
    /// Width the classifier artifact was trained on.
    pub expected_width: usize,
}

impl FeatureSpec {
    /// The obesity-classifier layout: 3 scaled + 5 raw + 23 one-hot = 31.
    #[must_use]
    pub fn obesity() -> Self {
        Self {
            scaled_numerical_fields: vec!["age", "height", "weight"],
            raw_numerical_fields: vec!["fcvc", "ncp", "ch2o", "faf", "tue"],
            categorical_fields: vec![
                "gender",
                "family_history_with_overweight",
                "favc",
                "caec",
                "smoke",
                "scc",
                "calc",
                "mtrans",
            ],
            categorical_vocabulary: vec![
                ("gender", vec!["Female", "Male"]),
                ("family_history_with_overweight", vec!["no", "yes"]),
                ("favc", vec!["no", "yes"]),
                ("caec", vec!["Always", "Frequently", "Sometimes", "no"]),
                ("smoke", vec!["no", "yes"]),
                ("scc", vec!["no", "yes"]),
                ("calc", vec!["Always", "Frequently", "Sometimes", "no"]),
                (
                    "mtrans",
                    vec![
                        "Automobile",
                        "Bike",
                        "Motorbike",
                        "Public_Transportation",
                        "Walking",
                    ],
                ),
            ],
            expected_width: EXPECTED_WIDTH,
        }
    }

    /// Vocabulary for one categorical field.
    #[must_use]
    pub fn vocabulary(&self, field: &str) -> Option<&[&'static str]> {
        self.categorical_vocabulary
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, values)| values.as_slice())
    }

    /// Total width implied by the configured layout.
    #[must_use]
    pub fn total_width(&self) -> usize {
        let one_hot: usize = self
            .categorical_vocabulary
            .iter()
            .map(|(_, values)| values.len())
            .sum();
        self.scaled_numerical_fields.len() + self.raw_numerical_fields.len() + one_hot
    }

    /// Column names in concatenation order, for diagnostics and status
    /// output. One-hot columns are named `field=value`.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.total_width());
        for field in &self.scaled_numerical_fields {
            names.push((*field).to_string());
        }
        for field in &self.raw_numerical_fields {
            names.push((*field).to_string());
        }
        for field in &self.categorical_fields {
            if let Some(values) = self.vocabulary(field) {
                for value in values {
                    names.push(format!("{field}={value}"));
                }
            }
        }
        names
    }

    /// Verify the layout is internally consistent and matches the width the
    /// classifier was trained on.
    ///
    /// A mismatch is a fatal configuration error (vocabulary/layout drift from
    /// the trained artifact), never a per-request error.
    ///
    /// # Errors
    /// Returns `FeatureWidthMismatch` if the layout width differs from
    /// `expected_width`, or if a categorical field has no vocabulary.
    pub fn validate(&self) -> Result<()> {
        for field in &self.categorical_fields {
            if self.vocabulary(field).map_or(true, |v| v.is_empty()) {
                return Err(PredictError::FeatureWidthMismatch {
                    expected: self.expected_width,
                    actual: self.total_width(),
                });
            }
        }

        let actual = self.total_width();
        if actual != self.expected_width {
            return Err(PredictError::FeatureWidthMismatch {
                expected: self.expected_width,
                actual,
            });
        }
        Ok(())
    }
}

impl Default for FeatureSpec {
    fn default() -> Self {
        Self::obesity()
    }
}
