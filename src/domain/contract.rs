//! Feature contract: canonical field names, aliasing, defaults, ranges.
//!
//! Historical clients submitted the same fields under several key schemes
//! (`GENDER`, `Gender`, `gender`, plus the legacy typo `matrans` for
//! `mtrans`). The contract rewrites every recognized key to its canonical
//! lowercase form, applies documented defaults for optional fields, and
//! enforces the numeric ranges before the encoder ever runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{PredictError, Result};

/// A single scalar value as submitted by a client: number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Interpret the value as a number, tolerating numeric strings.
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Interpret the value as a category string. Numbers are stringified so
    /// the vocabulary check downstream rejects them with the value named.
    fn as_category(&self) -> String {
        match self {
            Self::Number(n) => format!("{n}"),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Raw per-request input: field name (any historical casing) to value.
///
/// Transient, one per prediction request; produced by the external web/API
/// layer from the wire format.
pub type RawInput = BTreeMap<String, RawValue>;

/// Input record after key normalization, defaulting, and range validation.
///
/// Every field holds a canonical value; categorical strings are still in the
/// caller's spelling (the encoder validates them against the vocabulary and
/// applies the gender capitalization fix).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedInput {
    pub gender: String,
    pub age: f64,
    pub height: f64,
    pub weight: f64,
    pub family_history_with_overweight: String,
    pub favc: String,
    pub fcvc: f64,
    pub ncp: f64,
    pub caec: String,
    pub smoke: String,
    pub ch2o: f64,
    pub scc: String,
    pub faf: f64,
    pub tue: f64,
    pub calc: String,
    pub mtrans: String,
}

impl NormalizedInput {
    /// Look up a numeric field by canonical name (encoder support).
    #[must_use]
    pub fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "age" => Some(self.age),
            "height" => Some(self.height),
            "weight" => Some(self.weight),
            "fcvc" => Some(self.fcvc),
            "ncp" => Some(self.ncp),
            "ch2o" => Some(self.ch2o),
            "faf" => Some(self.faf),
            "tue" => Some(self.tue),
            _ => None,
        }
    }

    /// Look up a categorical field by canonical name (encoder support).
    #[must_use]
    pub fn category(&self, field: &str) -> Option<&str> {
        match field {
            "gender" => Some(&self.gender),
            "family_history_with_overweight" => Some(&self.family_history_with_overweight),
            "favc" => Some(&self.favc),
            "caec" => Some(&self.caec),
            "smoke" => Some(&self.smoke),
            "scc" => Some(&self.scc),
            "calc" => Some(&self.calc),
            "mtrans" => Some(&self.mtrans),
            _ => None,
        }
    }
}

/// Canonical field names recognized by the contract.
const CANONICAL_FIELDS: [&str; 16] = [
    "gender",
    "age",
    "height",
    "weight",
    "family_history_with_overweight",
    "favc",
    "fcvc",
    "ncp",
    "caec",
    "smoke",
    "ch2o",
    "scc",
    "faf",
    "tue",
    "calc",
    "mtrans",
];

/// Rewrite a raw key to canonical form, or `None` if unrecognized.
///
/// Matching is case-insensitive; `matrans` is a legacy client typo for
/// `mtrans` and maps to it.
fn canonical_key(key: &str) -> Option<&'static str> {
    let lower = key.trim().to_ascii_lowercase();
    let lower = if lower == "matrans" {
        "mtrans".to_string()
    } else {
        lower
    };
    CANONICAL_FIELDS.iter().find(|&&c| c == lower).copied()
}

/// Normalize a raw input mapping into a validated [`NormalizedInput`].
///
/// Unrecognized keys are ignored. Required fields (gender, age, height,
/// weight) have no defaults and fail with [`PredictError::MissingFeature`];
/// every other field falls back to its documented default. Numeric ranges
/// are enforced here, before the encoder runs.
///
/// Pure transformation, no side effects.
///
/// # Errors
/// Returns `MissingFeature` or `InvalidRange` on bad input.
pub fn normalize(raw: &RawInput) -> Result<NormalizedInput> {
    let mut fields: BTreeMap<&'static str, &RawValue> = BTreeMap::new();
    for (key, value) in raw {
        if let Some(canonical) = canonical_key(key) {
            fields.insert(canonical, value);
        }
    }

    let input = NormalizedInput {
        gender: required_category(&fields, "gender")?,
        age: in_range(&fields, "age", 1.0, 120.0, None)?,
        height: positive(&fields, "height")?,
        weight: positive(&fields, "weight")?,
        family_history_with_overweight: optional_category(
            &fields,
            "family_history_with_overweight",
            "yes",
        ),
        favc: optional_category(&fields, "favc", "yes"),
        fcvc: in_range(&fields, "fcvc", 1.0, 3.0, Some(2.0))?,
        ncp: in_range(&fields, "ncp", 1.0, 4.0, Some(3.0))?,
        caec: optional_category(&fields, "caec", "Sometimes"),
        smoke: optional_category(&fields, "smoke", "no"),
        ch2o: in_range(&fields, "ch2o", 1.0, 3.0, Some(2.0))?,
        scc: optional_category(&fields, "scc", "no"),
        faf: in_range(&fields, "faf", 0.0, 3.0, Some(1.0))?,
        tue: in_range(&fields, "tue", 0.0, 2.0, Some(1.0))?,
        calc: optional_category(&fields, "calc", "Sometimes"),
        mtrans: optional_category(&fields, "mtrans", "Public_Transportation"),
    };

    Ok(input)
}

fn required_category(fields: &BTreeMap<&'static str, &RawValue>, field: &str) -> Result<String> {
    fields
        .get(field)
        .map(|v| v.as_category())
        .ok_or_else(|| PredictError::MissingFeature(field.to_string()))
}

fn optional_category(
    fields: &BTreeMap<&'static str, &RawValue>,
    field: &str,
    default: &str,
) -> String {
    fields
        .get(field)
        .map_or_else(|| default.to_string(), |v| v.as_category())
}

/// Extract a numeric field and check it against an inclusive range.
///
/// A value that fails to parse as a number is reported as out of range with
/// value NaN (NaN never satisfies the bounds check).
fn in_range(
    fields: &BTreeMap<&'static str, &RawValue>,
    field: &str,
    min: f64,
    max: f64,
    default: Option<f64>,
) -> Result<f64> {
    let value = match fields.get(field) {
        Some(v) => v.as_number().unwrap_or(f64::NAN),
        None => match default {
            Some(d) => return Ok(d),
            None => return Err(PredictError::MissingFeature(field.to_string())),
        },
    };

    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(PredictError::InvalidRange {
            field: field.to_string(),
            value,
            min,
            max,
        })
    }
}

/// Extract a required numeric field that must be strictly positive
/// (height/weight; guards BMI against division by zero).
fn positive(fields: &BTreeMap<&'static str, &RawValue>, field: &str) -> Result<f64> {
    let value = fields
        .get(field)
        .ok_or_else(|| PredictError::MissingFeature(field.to_string()))?
        .as_number()
        .unwrap_or(f64::NAN);

    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(PredictError::InvalidRange {
            field: field.to_string(),
            value,
            min: 0.0,
            max: f64::INFINITY,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> RawInput {
        let mut raw = RawInput::new();
        raw.insert("gender".into(), "Male".into());
        raw.insert("age".into(), 30.0.into());
        raw.insert("height".into(), 175.0.into());
        raw.insert("weight".into(), 80.0.into());
        raw
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let input = normalize(&base_input()).expect("Should normalize");

        assert_eq!(input.family_history_with_overweight, "yes");
        assert_eq!(input.caec, "Sometimes");
        assert_eq!(input.mtrans, "Public_Transportation");
        assert!((input.fcvc - 2.0).abs() < f64::EPSILON);
        assert!((input.ncp - 3.0).abs() < f64::EPSILON);
        assert!((input.faf - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_legacy_uppercase_keys() {
        let mut raw = RawInput::new();
        raw.insert("GENDER".into(), "Male".into());
        raw.insert("Age".into(), 30.0.into());
        raw.insert("Height".into(), 175.0.into());
        raw.insert("WEIGHT".into(), 80.0.into());
        raw.insert("MTRANS".into(), "Walking".into());

        let input = normalize(&raw).expect("Should normalize");
        assert_eq!(input.gender, "Male");
        assert_eq!(input.mtrans, "Walking");
    }

    #[test]
    fn test_matrans_typo_alias() {
        let mut raw = base_input();
        raw.insert("matrans".into(), "Automobile".into());

        let input = normalize(&raw).expect("Should normalize");
        assert_eq!(input.mtrans, "Automobile");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut raw = base_input();
        raw.insert("user_id".into(), 42.0.into());
        raw.insert("comment".into(), "hello".into());

        assert!(normalize(&raw).is_ok());
    }

    #[test]
    fn test_missing_weight() {
        let mut raw = base_input();
        raw.remove("weight");

        let err = normalize(&raw).expect_err("Must fail");
        match err {
            PredictError::MissingFeature(field) => assert_eq!(field, "weight"),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_age_boundaries() {
        for age in [1.0, 120.0] {
            let mut raw = base_input();
            raw.insert("age".into(), age.into());
            assert!(normalize(&raw).is_ok(), "age {age} should be accepted");
        }
        for age in [0.0, 121.0] {
            let mut raw = base_input();
            raw.insert("age".into(), age.into());
            let err = normalize(&raw).expect_err("Must fail");
            assert!(
                matches!(err, PredictError::InvalidRange { ref field, .. } if field == "age"),
                "age {age} should be rejected"
            );
        }
    }

    #[test]
    fn test_nonpositive_height_rejected() {
        for height in [0.0, -170.0] {
            let mut raw = base_input();
            raw.insert("height".into(), height.into());
            let err = normalize(&raw).expect_err("Must fail");
            assert!(matches!(err, PredictError::InvalidRange { ref field, .. } if field == "height"));
        }
    }

    #[test]
    fn test_numeric_string_coercion() {
        let mut raw = base_input();
        raw.insert("age".into(), "45".into());

        let input = normalize(&raw).expect("Should normalize");
        assert!((input.age - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_numeric_age_rejected() {
        let mut raw = base_input();
        raw.insert("age".into(), "forty".into());

        let err = normalize(&raw).expect_err("Must fail");
        assert!(matches!(err, PredictError::InvalidRange { ref field, .. } if field == "age"));
    }

    #[test]
    fn test_range_check_on_optional_field() {
        let mut raw = base_input();
        raw.insert("ch2o".into(), 5.0.into());

        let err = normalize(&raw).expect_err("Must fail");
        assert!(matches!(err, PredictError::InvalidRange { ref field, .. } if field == "ch2o"));
    }
}
