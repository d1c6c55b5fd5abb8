//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the prediction pipeline and the trained-model artifact.

mod classifier;

pub use classifier::{ClassToken, Classification, Classifier, ClassifierError};
