//! Prediction outcome types.
//!
//! The result record returned to the web layer and optionally persisted by
//! it. Created fresh per request, immutable after construction.

use serde::{Deserialize, Serialize};

/// Risk tier derived from the predicted obesity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// No elevated obesity risk
    Low,
    /// Overweight; monitoring recommended
    Moderate,
    /// Obesity type I; intervention recommended
    High,
    /// Obesity type II
    #[serde(rename = "Very High")]
    VeryHigh,
    /// Obesity type III
    Extreme,
    /// Class label not in the risk table
    Unknown,
}

impl RiskLevel {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Intervention recommended",
            Self::VeryHigh => "Very high risk - Prompt consultation advised",
            Self::Extreme => "Extreme risk - Immediate consultation advised",
            Self::Unknown => "Unknown risk - Class not recognized",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
            Self::VeryHigh => write!(f, "VERY HIGH"),
            Self::Extreme => write!(f, "EXTREME"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Complete prediction record for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Unique identifier
    pub id: String,

    /// Decoded class name (e.g. "Obesity_Type_II")
    pub predicted_class: String,

    /// Top-class probability (0.0 to 1.0)
    pub probability: f64,

    /// Confidence score (0.0 to 1.0); equals probability unless the
    /// artifact provides no probability and a policy default was used
    pub confidence: f64,

    /// Body mass index from the raw inputs, kg/m²
    pub bmi: f64,

    /// Risk classification
    pub risk_level: RiskLevel,

    /// Guidance texts, in rule order
    pub recommendations: Vec<String>,

    /// Timestamp of the prediction
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionResult {
    /// Create a new result record with a fresh id and timestamp.
    #[must_use]
    pub fn new(
        predicted_class: String,
        probability: f64,
        confidence: f64,
        bmi: f64,
        risk_level: RiskLevel,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            id: uuid_v4(),
            predicted_class,
            probability,
            confidence,
            bmi,
            risk_level,
            recommendations,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Generate a simple UUID v4 (random) using CSPRNG.
///
/// Uses ChaCha20Rng seeded from OS entropy to ensure the identifiers are
/// unpredictable on all platforms.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_serialization() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::VeryHigh).unwrap(),
            "\"Very High\""
        );
        assert_eq!(serde_json::to_string(&RiskLevel::Low).unwrap(), "\"Low\"");

        let parsed: RiskLevel = serde_json::from_str("\"Very High\"").unwrap();
        assert_eq!(parsed, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_result_creation() {
        let result = PredictionResult::new(
            "Normal_Weight".to_string(),
            0.85,
            0.85,
            24.0,
            RiskLevel::Low,
            vec!["Keep it up".to_string()],
        );

        assert_eq!(result.predicted_class, "Normal_Weight");
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.id.len(), 36); // UUID format with dashes
    }

    #[test]
    fn test_uuid_generation() {
        let a = uuid_v4();
        let b = uuid_v4();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_result_json_shape() {
        let result = PredictionResult::new(
            "Obesity_Type_II".to_string(),
            0.72,
            0.72,
            36.5,
            RiskLevel::VeryHigh,
            vec![],
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["predicted_class"], "Obesity_Type_II");
        assert_eq!(json["risk_level"], "Very High");
        assert!(json["created_at"].is_string());
    }
}
