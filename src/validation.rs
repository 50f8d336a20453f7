use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PredictError;

pub const TRANSPORT_MODE: &str = "transport_mode";
pub const KM_PER_DAY: &str = "km_per_day";
pub const DIET_TYPE: &str = "diet_type";
pub const ELECTRICITY_KWH_PER_DAY: &str = "electricity_kWh_per_day";
pub const WASTE_KG_PER_DAY: &str = "waste_kg_per_day";

/// Canonical field order; error messages list fields in this order.
pub const REQUIRED_FIELDS: [&str; 5] = [
    TRANSPORT_MODE,
    KM_PER_DAY,
    DIET_TYPE,
    ELECTRICITY_KWH_PER_DAY,
    WASTE_KG_PER_DAY,
];

/// A request body that passed presence, type and range checks.
///
/// Category strings are trimmed but keep their original casing; they are
/// echoed back to the caller as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub transport_mode: String,
    pub km_per_day: f64,
    pub diet_type: String,
    #[serde(rename = "electricity_kWh_per_day")]
    pub electricity_kwh_per_day: f64,
    pub waste_kg_per_day: f64,
}

pub fn validate(payload: &Value) -> Result<PredictionRequest, PredictError> {
    let map = match payload {
        Value::Object(map) => map,
        Value::Null => return Err(PredictError::EmptyPayload),
        other => {
            return Err(PredictError::InvalidFormat(format!(
                "expected a JSON object, got {}",
                json_kind(other)
            )))
        }
    };
    if map.is_empty() {
        return Err(PredictError::EmptyPayload);
    }

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|k| !map.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(PredictError::MissingFields(missing));
    }

    let request = PredictionRequest {
        transport_mode: string_field(map, TRANSPORT_MODE)?,
        km_per_day: number_field(map, KM_PER_DAY)?,
        diet_type: string_field(map, DIET_TYPE)?,
        electricity_kwh_per_day: number_field(map, ELECTRICITY_KWH_PER_DAY)?,
        waste_kg_per_day: number_field(map, WASTE_KG_PER_DAY)?,
    };

    let negative: Vec<&'static str> = [
        (KM_PER_DAY, request.km_per_day),
        (ELECTRICITY_KWH_PER_DAY, request.electricity_kwh_per_day),
        (WASTE_KG_PER_DAY, request.waste_kg_per_day),
    ]
    .into_iter()
    .filter(|(_, v)| *v < 0.0)
    .map(|(k, _)| k)
    .collect();
    if !negative.is_empty() {
        return Err(PredictError::InvalidRange(negative));
    }

    Ok(request)
}

fn string_field(map: &Map<String, Value>, key: &'static str) -> Result<String, PredictError> {
    match &map[key] {
        Value::String(s) => Ok(s.trim().to_string()),
        other => Err(PredictError::InvalidFormat(format!(
            "{} must be a string, got {}",
            key,
            json_kind(other)
        ))),
    }
}

/// Accepts JSON numbers and numeric strings ("12.5", " 3 "). Non-finite
/// values are rejected so NaN never reaches the model.
fn number_field(map: &Map<String, Value>, key: &'static str) -> Result<f64, PredictError> {
    let parsed = match &map[key] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(PredictError::InvalidFormat(format!(
            "{} must be a real number, got {}",
            key, map[key]
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
