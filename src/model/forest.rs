//! Random forest regressor exported as flat node arrays.
//!
//! Each tree stores its nodes in a single vector with node 0 as the root.
//! Splits send a sample left when `x[feature] <= threshold`.

use anyhow::{bail, ensure, Result};
use serde::Deserialize;

use super::Regressor;
use crate::features::{FeatureVector, FEATURE_COUNT};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Children always point forward, so the walk terminates.
    fn check(&self, n_features: usize) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split { feature, threshold, left, right } => {
                    ensure!(feature < n_features, "node {} splits on feature {} (have {})", i, feature, n_features);
                    ensure!(threshold.is_finite(), "node {} has a non-finite threshold", i);
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            bail!("node {} has out-of-order child {}", i, child);
                        }
                    }
                }
                Node::Leaf { value } => {
                    ensure!(value.is_finite(), "leaf {} has a non-finite value", i);
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<Tree>,
}

impl RandomForest {
    pub fn check(&self) -> Result<()> {
        ensure!(
            self.n_features == FEATURE_COUNT,
            "forest expects {} features, service provides {}",
            self.n_features,
            FEATURE_COUNT
        );
        ensure!(!self.trees.is_empty(), "forest has no trees");
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features)
                .map_err(|e| e.context(format!("tree {}", i)))?;
        }
        Ok(())
    }
}

impl Regressor for RandomForest {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let x = features.as_slice();
        let sum: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
