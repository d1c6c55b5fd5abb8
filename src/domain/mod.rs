//! Domain layer: Core business types and logic.
//!
//! This module contains pure types and transformations with no external
//! dependencies. Feature normalization, encoding, and risk mapping all live
//! here; anything touching model artifacts goes through `ports`/`adapters`.

pub mod contract;
pub mod encoding;
pub mod outcome;
pub mod risk;
pub mod spec;

pub use contract::{normalize, NormalizedInput, RawInput, RawValue};
pub use encoding::{EncodedFeatures, FeatureEncoder, FittedScaler};
pub use outcome::{PredictionResult, RiskLevel};
pub use spec::FeatureSpec;
