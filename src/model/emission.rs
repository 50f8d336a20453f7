//! Emission-factor model: per-category daily factors instead of a fitted
//! regressor. Ships as the default artifact so the service answers without a
//! trained forest on disk.

use anyhow::{anyhow, ensure, Result};
use serde::Deserialize;

use super::Regressor;
use crate::{
    encoding::{DIET_CODES, TRANSPORT_CODES},
    features::{FeatureVector, DIET_IDX, ELECTRICITY_IDX, KM_IDX, TRANSPORT_IDX, WASTE_IDX},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmissionFactors {
    /// kg CO2e per km, indexed by transport code.
    pub transport_kg_per_km: Vec<f64>,
    /// kg CO2e per day, indexed by diet code.
    pub diet_kg_per_day: Vec<f64>,
    pub electricity_kg_per_kwh: f64,
    pub waste_kg_per_kg: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            transport_kg_per_km: vec![0.21, 0.089, 0.041, 0.0],
            diet_kg_per_day: vec![2.9, 3.8, 7.19],
            electricity_kg_per_kwh: 0.5,
            waste_kg_per_kg: 0.5,
        }
    }
}

impl EmissionFactors {
    pub fn check(&self) -> Result<()> {
        ensure!(
            self.transport_kg_per_km.len() == TRANSPORT_CODES.entries.len(),
            "need {} transport factors, got {}",
            TRANSPORT_CODES.entries.len(),
            self.transport_kg_per_km.len()
        );
        ensure!(
            self.diet_kg_per_day.len() == DIET_CODES.entries.len(),
            "need {} diet factors, got {}",
            DIET_CODES.entries.len(),
            self.diet_kg_per_day.len()
        );
        let all = self
            .transport_kg_per_km
            .iter()
            .chain(&self.diet_kg_per_day)
            .chain([&self.electricity_kg_per_kwh, &self.waste_kg_per_kg]);
        for f in all {
            ensure!(f.is_finite() && *f >= 0.0, "emission factor {} must be finite and non-negative", f);
        }
        Ok(())
    }

    fn factor(table: &[f64], code: f64, what: &str) -> Result<f64> {
        // codes come from the encoder, so they are small non-negative integers
        table
            .get(code as usize)
            .copied()
            .ok_or_else(|| anyhow!("no {} factor for code {}", what, code))
    }
}

impl Regressor for EmissionFactors {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let x = features.as_slice();
        let transport = Self::factor(&self.transport_kg_per_km, x[TRANSPORT_IDX], "transport")?;
        let diet = Self::factor(&self.diet_kg_per_day, x[DIET_IDX], "diet")?;
        Ok(transport * x[KM_IDX]
            + diet
            + self.electricity_kg_per_kwh * x[ELECTRICITY_IDX]
            + self.waste_kg_per_kg * x[WASTE_IDX])
    }

    fn name(&self) -> &str {
        "emission_factors"
    }
}
