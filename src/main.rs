//! Habitus: obesity-category prediction core.
//!
//! Thin command-line entry point around the library: loads model assets,
//! reads one raw input record as JSON (file argument or stdin), runs the
//! prediction pipeline, and prints the result as JSON.
//!
//! The production deployment embeds the library behind a web/API layer;
//! this binary exists for smoke-testing deployed model assets.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use habitus::adapters::{load_model_assets, ForestClassifier};
use habitus::{FeatureSpec, PredictionService, PredictorConfig, RawInput};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let model_dir: PathBuf = std::env::var("HABITUS_MODEL_DIR")
        .unwrap_or_else(|_| "models".to_string())
        .into();

    tracing::info!("Loading model assets from {model_dir:?}");
    let assets = load_model_assets(&model_dir).context("Failed to load model assets")?;

    let classifier = Arc::new(ForestClassifier::from_assets(&assets));
    let service = PredictionService::new(
        classifier,
        assets.scaler,
        FeatureSpec::obesity(),
        PredictorConfig::default(),
    )
    .context("Failed to construct prediction service")?;

    let raw: RawInput = match std::env::args().nth(1) {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read input file {path}"))?;
            serde_json::from_str(&content).context("Input file is not a valid JSON object")?
        }
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            serde_json::from_str(&content).context("Stdin is not a valid JSON object")?
        }
    };

    let result = service.predict(&raw)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
