//! Regressor backends and artifact loading.
//!
//! The service only relies on two capabilities: "load the artifact" and
//! "predict(vector) -> scalar". Anything implementing [`ModelLoader`] and
//! [`Regressor`] can be plugged in.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::PathBuf,
    sync::Arc,
};

use crate::features::FeatureVector;

pub mod emission;
pub mod forest;
pub mod linear;
#[cfg(feature = "torch")]
pub mod torch;

pub use emission::EmissionFactors;
pub use forest::RandomForest;
pub use linear::LinearModel;

pub trait Regressor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    fn name(&self) -> &str;
}

pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Regressor>>;

    /// Where the model comes from, for health and log output.
    fn source(&self) -> String;
}

/// On-disk JSON artifact, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    RandomForest(RandomForest),
    Linear(LinearModel),
    EmissionFactors(EmissionFactors),
}

impl Artifact {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse model artifact")
    }

    pub fn into_regressor(self) -> Result<Arc<dyn Regressor>> {
        let model: Arc<dyn Regressor> = match self {
            Self::RandomForest(m) => {
                m.check()?;
                Arc::new(m)
            }
            Self::Linear(m) => {
                m.check()?;
                Arc::new(m)
            }
            Self::EmissionFactors(m) => {
                m.check()?;
                Arc::new(m)
            }
        };
        Ok(model)
    }
}

/// Reads the artifact from a local file on every `load`.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    path: PathBuf,
}

impl ArtifactLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_json(&self) -> Result<Arc<dyn Regressor>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read model artifact at {}", self.path.display()))?;
        Artifact::from_json(&text)
            .and_then(Artifact::into_regressor)
            .with_context(|| format!("invalid model artifact {}", self.path.display()))
    }
}

impl ModelLoader for ArtifactLoader {
    fn load(&self) -> Result<Arc<dyn Regressor>> {
        #[cfg(feature = "torch")]
        if torch::is_torchscript_path(&self.path) {
            let model: Arc<dyn Regressor> = Arc::new(torch::TorchRegressor::load(&self.path)?);
            return Ok(model);
        }
        self.load_json()
    }

    fn source(&self) -> String {
        self.path.display().to_string()
    }
}
