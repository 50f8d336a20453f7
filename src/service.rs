//! Prediction service: owns the model and its load state.

use anyhow::Context;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    encoding::CategoryEncoder,
    error::PredictError,
    features::{FeatureVector, FEATURE_COUNT},
    model::{ModelLoader, Regressor},
    validation::{self, PredictionRequest},
};

pub enum ModelState {
    Unloaded { last_error: Option<String> },
    Ready(Arc<dyn Regressor>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus {
    pub model_loaded: bool,
    pub model_name: Option<String>,
    pub last_error: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub carbon_footprint: f64,
    pub request: PredictionRequest,
}

pub struct PredictionService {
    loader: Box<dyn ModelLoader>,
    encoder: CategoryEncoder,
    state: RwLock<ModelState>,
    reload_lock: Mutex<()>,
    log_predictions: bool,
}

impl PredictionService {
    /// Builds the service without touching the artifact.
    pub fn new(loader: Box<dyn ModelLoader>, encoder: CategoryEncoder) -> Self {
        Self {
            loader,
            encoder,
            state: RwLock::new(ModelState::Unloaded { last_error: None }),
            reload_lock: Mutex::new(()),
            log_predictions: false,
        }
    }

    /// Builds the service and makes the startup load attempt. A failed load
    /// leaves the service `Unloaded`; it never aborts.
    pub fn start(loader: Box<dyn ModelLoader>, encoder: CategoryEncoder) -> Self {
        let svc = Self::new(loader, encoder);
        if let Err(e) = svc.reload() {
            tracing::error!("failed to load model on startup: {:#}", e);
        }
        svc
    }

    pub fn with_prediction_logging(mut self, on: bool) -> Self {
        self.log_predictions = on;
        self
    }

    fn current(&self) -> Option<Arc<dyn Regressor>> {
        match &*self.state.read() {
            ModelState::Ready(m) => Some(Arc::clone(m)),
            ModelState::Unloaded { .. } => None,
        }
    }

    /// Loads the artifact and publishes it. Only one load runs at a time.
    pub fn reload(&self) -> anyhow::Result<Arc<dyn Regressor>> {
        let _guard = self.reload_lock.lock();
        self.load_locked()
    }

    fn load_locked(&self) -> anyhow::Result<Arc<dyn Regressor>> {
        match self.loader.load() {
            Ok(model) => {
                tracing::info!("model '{}' loaded from {}", model.name(), self.loader.source());
                *self.state.write() = ModelState::Ready(Arc::clone(&model));
                Ok(model)
            }
            Err(e) => {
                // keep whatever model was already serving
                let mut state = self.state.write();
                if let ModelState::Unloaded { last_error } = &mut *state {
                    *last_error = Some(format!("{:#}", e));
                }
                Err(e)
            }
        }
    }

    fn ensure_ready(&self) -> Result<Arc<dyn Regressor>, PredictError> {
        if let Some(m) = self.current() {
            return Ok(m);
        }
        let _guard = self.reload_lock.lock();
        // another request may have finished loading while we waited
        if let Some(m) = self.current() {
            return Ok(m);
        }
        tracing::info!("model not loaded, attempting to load...");
        self.load_locked().map_err(|e| {
            tracing::error!("lazy model load failed: {:#}", e);
            PredictError::ModelUnavailable
        })
    }

    /// One forward pass on an all-zero vector.
    pub fn warmup(&self) -> anyhow::Result<f64> {
        let model = self.current().context("model not loaded")?;
        model.predict(&FeatureVector([0.0; FEATURE_COUNT]))
    }

    pub fn predict(&self, payload: &Value) -> Result<Prediction, PredictError> {
        let model = self.ensure_ready()?;

        let request = validation::validate(payload)?;
        let codes = self
            .encoder
            .encode_pair(&request.transport_mode, &request.diet_type)?;
        let features = FeatureVector::assemble(&request, codes);

        if self.log_predictions {
            tracing::info!("features [{}]", features.describe());
        }

        let raw = model
            .predict(&features)
            .map_err(|e| PredictError::Internal(format!("{:#}", e)))?;
        let carbon_footprint = postprocess(raw)
            .ok_or_else(|| PredictError::Internal(format!("model returned non-finite value {}", raw)))?;

        tracing::info!(
            "prediction made: {} kg CO2 for transport={} km={} diet={} kwh={} waste={}",
            carbon_footprint,
            request.transport_mode,
            request.km_per_day,
            request.diet_type,
            request.electricity_kwh_per_day,
            request.waste_kg_per_day
        );

        Ok(Prediction {
            carbon_footprint,
            request,
        })
    }

    pub fn health(&self) -> HealthStatus {
        let (model_loaded, model_name, last_error) = match &*self.state.read() {
            ModelState::Ready(m) => (true, Some(m.name().to_string()), None),
            ModelState::Unloaded { last_error } => (false, None, last_error.clone()),
        };
        HealthStatus {
            model_loaded,
            model_name,
            last_error,
            source: self.loader.source(),
        }
    }
}

/// Above 2^52 every f64 is already an integer.
const INTEGRAL_ABOVE: f64 = 4_503_599_627_370_496.0;

/// Rounds to 2 decimals and clamps at zero. `None` for NaN/inf.
pub fn postprocess(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    // scaling by 100 would overflow for the largest finite values
    let rounded = if raw.abs() >= INTEGRAL_ABOVE {
        raw
    } else {
        (raw * 100.0).round() / 100.0
    };
    Some(if rounded > 0.0 { rounded } else { 0.0 })
}
