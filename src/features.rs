use crate::{encoding::EncodedCategories, validation::PredictionRequest};

pub const FEATURE_COUNT: usize = 5;

/// Column names in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "transport_mode_encoded",
    "km_per_day",
    "diet_type_encoded",
    "electricity_kWh_per_day",
    "waste_kg_per_day",
];

pub const TRANSPORT_IDX: usize = 0;
pub const KM_IDX: usize = 1;
pub const DIET_IDX: usize = 2;
pub const ELECTRICITY_IDX: usize = 3;
pub const WASTE_IDX: usize = 4;

/// Model input: `[transport_code, km, diet_code, kWh, waste_kg]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn assemble(req: &PredictionRequest, codes: EncodedCategories) -> Self {
        let mut v = [0.0; FEATURE_COUNT];
        v[TRANSPORT_IDX] = f64::from(codes.transport);
        v[KM_IDX] = req.km_per_day;
        v[DIET_IDX] = f64::from(codes.diet);
        v[ELECTRICITY_IDX] = req.electricity_kwh_per_day;
        v[WASTE_IDX] = req.waste_kg_per_day;
        Self(v)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// `name=value` pairs for log lines.
    pub fn describe(&self) -> String {
        FEATURE_NAMES
            .iter()
            .zip(self.0.iter())
            .map(|(name, v)| format!("{}={:.3}", name, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
