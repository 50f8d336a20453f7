//! HTTP routes.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{any::Any, sync::Arc};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::{
    error::{error_response, PredictError},
    service::PredictionService,
    validation::PredictionRequest,
};

pub const API_VERSION: &str = "1.0.0";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
}

#[derive(Serialize)]
struct PredictOut {
    carbon_footprint: f64,
    input_features: PredictionRequest,
    status: &'static str,
}

#[derive(Serialize)]
struct HealthOut {
    status: &'static str,
    model_loaded: bool,
    message: &'static str,
}

pub fn router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/", get(root).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/predict", post(predict).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(AppState { service })
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(panic_response))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Carbon Footprint Prediction API",
        "version": API_VERSION,
        "endpoints": {
            "GET /": "API information",
            "GET /health": "Health check",
            "POST /predict": "Predict carbon footprint",
        },
        "predict_endpoint_example": {
            "url": "/predict",
            "method": "POST",
            "content_type": "application/json",
            "body": {
                "transport_mode": "car",
                "km_per_day": 25,
                "diet_type": "mixed",
                "electricity_kWh_per_day": 12.5,
                "waste_kg_per_day": 1.8,
            },
        },
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    let h = state.service.health();
    Json(HealthOut {
        status: "healthy",
        model_loaded: h.model_loaded,
        message: "Carbon Footprint Prediction API is running",
    })
}

/// Takes raw bytes so malformed JSON becomes our own 400 instead of the
/// extractor's rejection.
async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<PredictOut>, PredictError> {
    let payload: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| PredictError::InvalidFormat(format!("malformed JSON body: {}", e)))?
    };

    // model loading and inference are synchronous; keep them off the async workers
    let service = Arc::clone(&state.service);
    let out = match tokio::task::spawn_blocking(move || service.predict(&payload)).await {
        Ok(result) => result?,
        // re-raise so the panic layer answers it
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => return Err(PredictError::Internal(format!("prediction task failed: {}", e))),
    };
    Ok(Json(PredictOut {
        carbon_footprint: out.carbon_footprint,
        input_features: out.request,
        status: "success",
    }))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Endpoint not found")
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("handler panicked: {}", detail);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
