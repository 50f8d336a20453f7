use anyhow::{ensure, Result};
use serde::Deserialize;

use super::Regressor;
use crate::features::{FeatureVector, FEATURE_COUNT};

/// `intercept + coefficients · x`.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn check(&self) -> Result<()> {
        ensure!(
            self.coefficients.len() == FEATURE_COUNT,
            "linear model has {} coefficients, expected {}",
            self.coefficients.len(),
            FEATURE_COUNT
        );
        ensure!(
            self.intercept.is_finite() && self.coefficients.iter().all(|c| c.is_finite()),
            "linear model has non-finite parameters"
        );
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features.as_slice())
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }

    fn name(&self) -> &str {
        "linear"
    }
}
