use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Everything that can go wrong while turning a request body into a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("No JSON data provided")]
    EmptyPayload,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid input format: {0}")]
    InvalidFormat(String),

    #[error("Numerical values must be non-negative: {}", .0.join(", "))]
    InvalidRange(Vec<&'static str>),

    #[error("Invalid {field}: {value}. Valid options: {}", .valid.join(", "))]
    InvalidCategory {
        field: &'static str,
        value: String,
        valid: Vec<&'static str>,
    },

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("internal prediction failure: {0}")]
    Internal(String),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error during prediction".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(detail) => tracing::error!("prediction error: {}", detail),
            Self::ModelUnavailable => tracing::error!("prediction rejected: model not loaded"),
            other => tracing::debug!("rejected request: {}", other),
        }
        error_response(self.status(), &self.public_message())
    }
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
