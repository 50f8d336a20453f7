//! TorchScript backend, enabled with the `torch` feature.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use super::Regressor;
use crate::features::{FeatureVector, FEATURE_COUNT};

pub fn is_torchscript_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("pt") | Some("ts")
    )
}

pub struct TorchRegressor {
    model: CModule,
    device: Device,
}

impl TorchRegressor {
    pub fn load(path: &Path) -> Result<Self> {
        let device = Device::Cpu;
        let model = CModule::load_on_device(path, device)
            .with_context(|| format!("failed to load TorchScript {}", path.display()))?;

        // Probe output shape with a dummy forward; expect one value per row.
        let dummy = Tensor::zeros([1, FEATURE_COUNT as i64], (Kind::Float, device));
        let out = model.forward_ts(&[dummy])?;
        if out.numel() != 1 {
            bail!("unexpected model output size: {:?}", out.size());
        }
        Ok(Self { model, device })
    }
}

impl Regressor for TorchRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let x: Vec<f32> = features.as_slice().iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&x)
            .reshape([1, FEATURE_COUNT as i64])
            .to_device(self.device);
        let out = self.model.forward_ts(&[input])?;
        if out.numel() != 1 {
            bail!("unexpected model output size: {:?}", out.size());
        }
        Ok(out.reshape([-1]).double_value(&[0]))
    }

    fn name(&self) -> &str {
        "torchscript"
    }
}
