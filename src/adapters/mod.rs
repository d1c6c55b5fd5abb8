//! Adapters layer: Concrete implementations of the ports.
//!
//! The forest adapter backs the [`crate::ports::Classifier`] port with a
//! JSON-exported random-forest artifact produced offline by the training
//! pipeline.

pub mod forest;

pub use forest::{
    load_model_assets, ArtifactError, ForestClassifier, LabelVocabulary, ModelAssets,
};
