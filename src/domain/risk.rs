//! Risk tier and recommendation mapping.
//!
//! Pure functions from the decoded class label (plus BMI and a few
//! lifestyle fields) to a coarse risk tier and guidance texts. An
//! unrecognized class maps to [`RiskLevel::Unknown`]; this layer never
//! fails.

use crate::domain::contract::NormalizedInput;
use crate::domain::outcome::RiskLevel;

/// Guidance text for BMI below the healthy band.
pub const REC_UNDERWEIGHT: &str =
    "Ensure adequate caloric intake and focus on nutrient-dense foods";
/// Guidance text for BMI in the healthy band.
pub const REC_MAINTAIN: &str =
    "Maintain your current healthy lifestyle and keep a balanced, varied diet";
/// Guidance text for BMI in the overweight band.
pub const REC_OVERWEIGHT: &str =
    "Focus on a balanced diet with plenty of fruits and vegetables and monitor portion sizes";
/// Guidance text for BMI in the obese band.
pub const REC_OBESITY: &str =
    "Consult with a healthcare professional for personalized advice";
/// Guidance when high-calorie food consumption is frequent.
pub const REC_HIGH_CALORIE: &str = "Reduce the frequency of high-calorie food consumption";
/// Guidance when daily water intake is low.
pub const REC_WATER: &str = "Increase daily water intake to at least 2 liters";
/// Guidance when physical activity is low.
pub const REC_ACTIVITY: &str = "Increase physical activity to at least 150 minutes per week";
/// Guidance when between-meal snacking is constant.
pub const REC_SNACKING: &str = "Reduce snacking between meals";

/// Map a decoded class label to its risk tier.
///
/// `Insufficient_Weight` is an explicit `Low` entry: underweight carries its
/// own guidance but is not an elevated obesity risk. Anything outside the
/// table is `Unknown`.
#[must_use]
pub fn risk_for_class(label: &str) -> RiskLevel {
    match label {
        "Insufficient_Weight" | "Normal_Weight" => RiskLevel::Low,
        "Overweight_Level_I" | "Overweight_Level_II" => RiskLevel::Moderate,
        "Obesity_Type_I" => RiskLevel::High,
        "Obesity_Type_II" => RiskLevel::VeryHigh,
        "Obesity_Type_III" => RiskLevel::Extreme,
        _ => RiskLevel::Unknown,
    }
}

/// Collect recommendation texts for a prediction.
///
/// Rules are evaluated in a fixed order and every matching rule's text is
/// appended, not just the first match.
#[must_use]
pub fn recommendations(bmi: f64, input: &NormalizedInput) -> Vec<String> {
    let mut out = Vec::new();

    if bmi < 18.5 {
        out.push(REC_UNDERWEIGHT.to_string());
    } else if bmi < 25.0 {
        out.push(REC_MAINTAIN.to_string());
    } else if bmi < 30.0 {
        out.push(REC_OVERWEIGHT.to_string());
    } else {
        out.push(REC_OBESITY.to_string());
    }

    if input.favc == "yes" {
        out.push(REC_HIGH_CALORIE.to_string());
    }
    if input.ch2o < 2.0 {
        out.push(REC_WATER.to_string());
    }
    if input.faf < 1.0 {
        out.push(REC_ACTIVITY.to_string());
    }
    if input.caec == "Always" {
        out.push(REC_SNACKING.to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{normalize, RawInput, RawValue};

    fn input_with(overrides: &[(&str, RawValue)]) -> NormalizedInput {
        let mut raw = RawInput::new();
        raw.insert("gender".into(), "Male".into());
        raw.insert("age".into(), 30.0.into());
        raw.insert("height".into(), 175.0.into());
        raw.insert("weight".into(), 80.0.into());
        for (key, value) in overrides {
            raw.insert((*key).to_string(), value.clone());
        }
        normalize(&raw).expect("Should normalize")
    }

    #[test]
    fn test_risk_table() {
        assert_eq!(risk_for_class("Normal_Weight"), RiskLevel::Low);
        assert_eq!(risk_for_class("Insufficient_Weight"), RiskLevel::Low);
        assert_eq!(risk_for_class("Overweight_Level_I"), RiskLevel::Moderate);
        assert_eq!(risk_for_class("Overweight_Level_II"), RiskLevel::Moderate);
        assert_eq!(risk_for_class("Obesity_Type_I"), RiskLevel::High);
        assert_eq!(risk_for_class("Obesity_Type_II"), RiskLevel::VeryHigh);
        assert_eq!(risk_for_class("Obesity_Type_III"), RiskLevel::Extreme);
        assert_eq!(risk_for_class("Somewhat_Round"), RiskLevel::Unknown);
    }

    #[test]
    fn test_bmi_bands() {
        let input = input_with(&[("favc", "no".into())]);

        assert_eq!(recommendations(17.0, &input)[0], REC_UNDERWEIGHT);
        assert_eq!(recommendations(18.5, &input)[0], REC_MAINTAIN);
        assert_eq!(recommendations(24.9, &input)[0], REC_MAINTAIN);
        assert_eq!(recommendations(25.0, &input)[0], REC_OVERWEIGHT);
        assert_eq!(recommendations(30.0, &input)[0], REC_OBESITY);
    }

    #[test]
    fn test_all_matching_rules_appended() {
        let input = input_with(&[
            ("favc", "yes".into()),
            ("ch2o", 1.0.into()),
            ("faf", 0.0.into()),
            ("caec", "Always".into()),
        ]);

        let recs = recommendations(32.0, &input);
        assert_eq!(
            recs,
            vec![
                REC_OBESITY.to_string(),
                REC_HIGH_CALORIE.to_string(),
                REC_WATER.to_string(),
                REC_ACTIVITY.to_string(),
                REC_SNACKING.to_string(),
            ]
        );
    }

    #[test]
    fn test_water_rule_threshold() {
        let thirsty = input_with(&[("ch2o", 1.0.into()), ("favc", "no".into())]);
        let hydrated = input_with(&[("ch2o", 2.5.into()), ("favc", "no".into())]);

        assert!(recommendations(22.0, &thirsty).contains(&REC_WATER.to_string()));
        assert!(!recommendations(22.0, &hydrated).contains(&REC_WATER.to_string()));
    }

    #[test]
    fn test_activity_rule_threshold() {
        let sedentary = input_with(&[("faf", 0.5.into()), ("favc", "no".into())]);
        let active = input_with(&[("faf", 1.0.into()), ("favc", "no".into())]);

        assert!(recommendations(22.0, &sedentary).contains(&REC_ACTIVITY.to_string()));
        assert!(!recommendations(22.0, &active).contains(&REC_ACTIVITY.to_string()));
    }
}
