//! Forest adapter: JSON-exported random-forest artifact.
//!
//! The training pipeline runs offline and exports three JSON assets, one
//! per pickle the original pipeline produced:
//!
//! - `forest.json` — the tree ensemble in flat-array form (per tree:
//!   `feature`, `threshold`, `children_left`, `children_right`, `value`)
//! - `scaler.json` — the fitted standard scaler over age/height/weight
//! - `label_encoder.json` — ordered class names (token index to name)
//!
//! An optional `manifest.json` binds the asset files to SHA-256 digests.
//! When present, every referenced file must hash to its recorded digest and
//! loading fails closed on mismatch; when absent, the loader logs a warning
//! and proceeds with unverified assets.
//!
//! All assets are loaded once at startup and are immutable afterwards.
//! Tree traversal is stateless, so one [`ForestClassifier`] can serve
//! concurrent predictions without locking.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::encoding::FittedScaler;
use crate::ports::{ClassToken, Classification, Classifier, ClassifierError};

/// Leaf marker in the `feature` array (sklearn export convention).
const LEAF_FEATURE: i64 = -2;
/// Leaf marker in the child arrays.
const LEAF_CHILD: i64 = -1;

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {path}: {message}")]
    Format { path: String, message: String },

    #[error("hash mismatch for {0}")]
    IntegrityMismatch(String),

    #[error("invalid model assets: {0}")]
    Invalid(String),
}

/// One decision tree in flat-array form.
///
/// `feature[i] == -2` marks node `i` as a leaf; internal nodes route to
/// `children_left[i]` when `x[feature[i]] <= threshold[i]`, else to
/// `children_right[i]`. `value[i]` holds the class counts observed at the
/// node during training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedTree {
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub value: Vec<Vec<f64>>,
}

impl ExportedTree {
    fn node_count(&self) -> usize {
        self.feature.len()
    }

    /// Structural sanity checks so traversal never indexes out of bounds.
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.threshold.len() != n
            || self.children_left.len() != n
            || self.children_right.len() != n
            || self.value.len() != n
        {
            return Err(format!("tree arrays disagree on node count {n}"));
        }

        for i in 0..n {
            let is_leaf = self.feature[i] == LEAF_FEATURE;
            if is_leaf {
                if self.children_left[i] != LEAF_CHILD || self.children_right[i] != LEAF_CHILD {
                    return Err(format!("leaf node {i} has children"));
                }
            } else {
                let feature = self.feature[i];
                if feature < 0 || feature as usize >= n_features {
                    return Err(format!("node {i} splits on invalid feature {feature}"));
                }
                for child in [self.children_left[i], self.children_right[i]] {
                    if child <= i as i64 || child as usize >= n {
                        return Err(format!("node {i} has invalid child {child}"));
                    }
                }
            }
            if self.value[i].len() != n_classes {
                return Err(format!(
                    "node {i} has {} class counts, expected {n_classes}",
                    self.value[i].len()
                ));
            }
        }
        Ok(())
    }

    /// Walk to a leaf and return its class counts.
    fn leaf_counts(&self, features: &[f64]) -> &[f64] {
        let mut node = 0usize;
        while self.feature[node] != LEAF_FEATURE {
            let feature = self.feature[node] as usize;
            node = if features[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }
}

/// The exported tree ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedForest {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<ExportedTree>,
}

impl ExportedForest {
    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 || self.n_classes == 0 {
            return Err("n_features and n_classes must be positive".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    /// Averaged class distribution over all trees.
    fn class_distribution(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        let mut distribution = vec![0.0; self.n_classes];

        for tree in &self.trees {
            let counts = tree.leaf_counts(features);
            let total: f64 = counts.iter().sum();
            if total <= 0.0 {
                return Err(ClassifierError::Failed(
                    "leaf with no class counts".to_string(),
                ));
            }
            for (slot, count) in distribution.iter_mut().zip(counts) {
                *slot += count / total;
            }
        }

        for slot in &mut distribution {
            *slot /= self.trees.len() as f64;
        }
        Ok(distribution)
    }
}

/// Ordered class names; token index maps to position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelVocabulary {
    pub classes: Vec<String>,
}

impl LabelVocabulary {
    /// Decode a token, falling back to the stringified token when out of
    /// range.
    #[must_use]
    pub fn decode(&self, token: ClassToken) -> String {
        self.classes
            .get(token.0)
            .cloned()
            .unwrap_or_else(|| token.0.to_string())
    }
}

/// Model assets loaded from disk. Each component is independently
/// optional: a missing scaler or label vocabulary degrades behavior (see
/// the encoder and decoder fallbacks) while a missing forest makes
/// classification unavailable.
#[derive(Debug, Clone, Default)]
pub struct ModelAssets {
    pub forest: Option<ExportedForest>,
    pub scaler: Option<FittedScaler>,
    pub labels: Option<LabelVocabulary>,
}

/// Integrity manifest binding asset files to SHA-256 digests.
#[derive(Debug, Clone, Deserialize)]
struct AssetManifest {
    version: u32,
    files: BTreeMap<String, String>,
}

/// Load model assets from a directory.
///
/// Missing asset files are logged and skipped (degraded modes); present
/// but malformed files are errors. When `manifest.json` exists, every file
/// it references must hash to its recorded digest.
///
/// # Errors
/// Returns [`ArtifactError`] on unreadable/malformed files or integrity
/// mismatches.
pub fn load_model_assets(dir: &Path) -> Result<ModelAssets, ArtifactError> {
    verify_manifest(dir)?;

    let mut assets = ModelAssets::default();

    if let Some(forest) = load_json::<ExportedForest>(&dir.join("forest.json"))? {
        forest
            .validate()
            .map_err(|e| ArtifactError::Invalid(format!("forest.json: {e}")))?;
        tracing::info!(
            "Loaded forest artifact ({} trees, {} features, {} classes)",
            forest.trees.len(),
            forest.n_features,
            forest.n_classes
        );
        assets.forest = Some(forest);
    } else {
        tracing::warn!("forest.json not found in {dir:?}; classification unavailable");
    }

    if let Some(scaler) = load_json::<FittedScaler>(&dir.join("scaler.json"))? {
        if scaler.mean.len() != scaler.scale.len() || scaler.mean.is_empty() {
            return Err(ArtifactError::Invalid(
                "scaler.json: mean and scale must be non-empty and equal length".to_string(),
            ));
        }
        tracing::info!("Loaded fitted scaler ({} fields)", scaler.mean.len());
        assets.scaler = Some(scaler);
    } else {
        tracing::warn!("scaler.json not found in {dir:?}; numeric fields pass through unscaled");
    }

    if let Some(labels) = load_json::<LabelVocabulary>(&dir.join("label_encoder.json"))? {
        if labels.classes.is_empty() {
            return Err(ArtifactError::Invalid(
                "label_encoder.json: empty class list".to_string(),
            ));
        }
        tracing::info!("Loaded label vocabulary ({} classes)", labels.classes.len());
        assets.labels = Some(labels);
    } else {
        tracing::warn!("label_encoder.json not found in {dir:?}; labels fall back to raw tokens");
    }

    if let (Some(forest), Some(labels)) = (&assets.forest, &assets.labels) {
        if labels.classes.len() != forest.n_classes {
            return Err(ArtifactError::Invalid(format!(
                "label vocabulary has {} classes, forest expects {}",
                labels.classes.len(),
                forest.n_classes
            )));
        }
    }

    Ok(assets)
}

/// Verify the asset manifest when one is present.
fn verify_manifest(dir: &Path) -> Result<(), ArtifactError> {
    let manifest_path = dir.join("manifest.json");
    if !manifest_path.exists() {
        tracing::warn!("No manifest.json in {dir:?}; loading unverified model assets");
        return Ok(());
    }

    let manifest: AssetManifest = load_json(&manifest_path)?.ok_or_else(|| ArtifactError::Io {
        path: manifest_path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "manifest vanished"),
    })?;

    if manifest.version != 1 {
        return Err(ArtifactError::Format {
            path: manifest_path.display().to_string(),
            message: format!("unsupported manifest version {}", manifest.version),
        });
    }
    if manifest.files.is_empty() {
        return Err(ArtifactError::Format {
            path: manifest_path.display().to_string(),
            message: "manifest references no files".to_string(),
        });
    }

    for (rel, expected_hex) in &manifest.files {
        let path = dir.join(rel);
        let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let actual_hex = sha256_hex(&bytes);
        if actual_hex != *expected_hex {
            return Err(ArtifactError::IntegrityMismatch(rel.clone()));
        }
    }

    tracing::info!("Model asset hashes verified against manifest");
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Read and parse a JSON file, returning `Ok(None)` when it does not exist.
fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, ArtifactError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed = serde_json::from_str(&content).map_err(|e| ArtifactError::Format {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(parsed))
}

/// [`Classifier`] implementation over the exported forest.
pub struct ForestClassifier {
    forest: Option<ExportedForest>,
    labels: Option<LabelVocabulary>,
}

impl ForestClassifier {
    /// Build a classifier from loaded parts.
    #[must_use]
    pub fn new(forest: Option<ExportedForest>, labels: Option<LabelVocabulary>) -> Self {
        Self { forest, labels }
    }

    /// Build a classifier from a loaded asset bundle (the scaler stays
    /// with the caller; it belongs to the encoder, not the classifier).
    #[must_use]
    pub fn from_assets(assets: &ModelAssets) -> Self {
        Self::new(assets.forest.clone(), assets.labels.clone())
    }
}

impl Classifier for ForestClassifier {
    fn classify(&self, features: &[f64]) -> Result<Classification, ClassifierError> {
        let forest = self.forest.as_ref().ok_or(ClassifierError::Unavailable)?;

        if features.len() != forest.n_features {
            return Err(ClassifierError::Failed(format!(
                "expected {} features, got {}",
                forest.n_features,
                features.len()
            )));
        }

        let distribution = forest.class_distribution(features)?;

        // Argmax; ties resolve to the lowest index for determinism.
        let (token, probability) = distribution
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |(best, max), (i, p)| {
                if *p > max {
                    (i, *p)
                } else {
                    (best, max)
                }
            });

        Ok(Classification {
            token: ClassToken(token),
            probability: Some(probability),
        })
    }

    fn decode(&self, token: ClassToken) -> String {
        match &self.labels {
            Some(labels) => labels.decode(token),
            None => token.0.to_string(),
        }
    }

    fn feature_width(&self) -> Option<usize> {
        self.forest.as_ref().map(|f| f.n_features)
    }

    fn is_available(&self) -> bool {
        self.forest.is_some()
    }

    fn has_decoder(&self) -> bool {
        self.labels.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// A two-class stump on feature 0: x0 <= 0.5 goes to class 0, else
    /// class 1.
    fn stump(left_counts: Vec<f64>, right_counts: Vec<f64>) -> ExportedTree {
        ExportedTree {
            feature: vec![0, LEAF_FEATURE, LEAF_FEATURE],
            threshold: vec![0.5, -2.0, -2.0],
            children_left: vec![1, LEAF_CHILD, LEAF_CHILD],
            children_right: vec![2, LEAF_CHILD, LEAF_CHILD],
            value: vec![vec![0.0, 0.0], left_counts, right_counts],
        }
    }

    fn stump_forest() -> ExportedForest {
        ExportedForest {
            n_features: 2,
            n_classes: 2,
            trees: vec![
                stump(vec![9.0, 1.0], vec![1.0, 9.0]),
                stump(vec![8.0, 2.0], vec![3.0, 7.0]),
            ],
        }
    }

    #[test]
    fn test_forest_classification() {
        let classifier = ForestClassifier::new(Some(stump_forest()), None);

        let low = classifier.classify(&[0.0, 0.0]).expect("Should classify");
        assert_eq!(low.token, ClassToken(0));
        // (0.9 + 0.8) / 2
        assert!((low.probability.unwrap() - 0.85).abs() < 1e-9);

        let high = classifier.classify(&[1.0, 0.0]).expect("Should classify");
        assert_eq!(high.token, ClassToken(1));
        assert!((high.probability.unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = ForestClassifier::new(Some(stump_forest()), None);
        let a = classifier.classify(&[0.3, 1.0]).unwrap();
        let b = classifier.classify(&[0.3, 1.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unavailable_without_forest() {
        let classifier = ForestClassifier::new(None, None);
        let err = classifier.classify(&[0.0, 0.0]).expect_err("Must fail");
        assert!(matches!(err, ClassifierError::Unavailable));
        assert!(!classifier.is_available());
    }

    #[test]
    fn test_feature_width_checked() {
        let classifier = ForestClassifier::new(Some(stump_forest()), None);
        let err = classifier.classify(&[0.0]).expect_err("Must fail");
        assert!(matches!(err, ClassifierError::Failed(_)));
    }

    #[test]
    fn test_decode_with_and_without_vocabulary() {
        let labels = LabelVocabulary {
            classes: vec!["Normal_Weight".to_string(), "Obesity_Type_I".to_string()],
        };
        let with = ForestClassifier::new(Some(stump_forest()), Some(labels));
        assert_eq!(with.decode(ClassToken(1)), "Obesity_Type_I");
        assert!(with.has_decoder());

        let without = ForestClassifier::new(Some(stump_forest()), None);
        assert_eq!(without.decode(ClassToken(1)), "1");
        assert!(!without.has_decoder());
    }

    #[test]
    fn test_tree_validation_rejects_bad_child() {
        let mut tree = stump(vec![1.0, 0.0], vec![0.0, 1.0]);
        tree.children_right[0] = 99;

        let forest = ExportedForest {
            n_features: 2,
            n_classes: 2,
            trees: vec![tree],
        };
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_load_assets_roundtrip() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();

        std::fs::write(
            dir.join("forest.json"),
            serde_json::to_string(&stump_forest()).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.join("scaler.json"),
            r#"{"mean": [1.0, 2.0], "scale": [0.5, 0.5]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("label_encoder.json"),
            r#"{"classes": ["Normal_Weight", "Obesity_Type_I"]}"#,
        )
        .unwrap();

        let assets = load_model_assets(dir).expect("Should load");
        assert!(assets.forest.is_some());
        assert!(assets.scaler.is_some());
        assert!(assets.labels.is_some());
    }

    #[test]
    fn test_load_assets_partial() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();

        std::fs::write(
            dir.join("forest.json"),
            serde_json::to_string(&stump_forest()).unwrap(),
        )
        .unwrap();

        let assets = load_model_assets(dir).expect("Should load");
        assert!(assets.forest.is_some());
        assert!(assets.scaler.is_none());
        assert!(assets.labels.is_none());
    }

    #[test]
    fn test_manifest_verification() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();

        let forest_json = serde_json::to_string(&stump_forest()).unwrap();
        std::fs::write(dir.join("forest.json"), &forest_json).unwrap();

        let manifest = format!(
            r#"{{"version": 1, "files": {{"forest.json": "{}"}}}}"#,
            sha256_hex(forest_json.as_bytes())
        );
        std::fs::write(dir.join("manifest.json"), manifest).unwrap();

        assert!(load_model_assets(dir).is_ok());
    }

    #[test]
    fn test_manifest_hash_mismatch_fails_closed() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();

        std::fs::write(
            dir.join("forest.json"),
            serde_json::to_string(&stump_forest()).unwrap(),
        )
        .unwrap();
        let manifest = format!(r#"{{"version": 1, "files": {{"forest.json": "{}"}}}}"#, "00".repeat(32));
        std::fs::write(dir.join("manifest.json"), manifest).unwrap();

        let err = load_model_assets(dir).expect_err("Must fail");
        assert!(matches!(err, ArtifactError::IntegrityMismatch(file) if file == "forest.json"));
    }

    #[test]
    fn test_label_count_mismatch_rejected() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();

        std::fs::write(
            dir.join("forest.json"),
            serde_json::to_string(&stump_forest()).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.join("label_encoder.json"), r#"{"classes": ["Only_One"]}"#).unwrap();

        let err = load_model_assets(dir).expect_err("Must fail");
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }

    #[test]
    fn test_malformed_forest_rejected() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        std::fs::write(dir.join("forest.json"), "{not json").unwrap();

        let err = load_model_assets(dir).expect_err("Must fail");
        assert!(matches!(err, ArtifactError::Format { .. }));
    }
}
