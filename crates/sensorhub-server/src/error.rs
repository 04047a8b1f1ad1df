//! Error types for the gateway.
//!
//! [`ApiError`] unifies all handler failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The JSON
//! body is `{ "code": <status>, "message": <text> }`, the shape dashboard
//! clients already parse for successful responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sensorhub_store::StoreError;
use tracing::error;

/// Errors that can occur in the REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body was unusable or missing required fields.
    #[error("{0}")]
    Validation(String),

    /// The requested sensor does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Persisting or reading state failed.
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => Self::Validation(msg),
            StoreError::NotFound(_) => Self::NotFound(String::from("Sensor not found")),
            StoreError::Persistence { .. } => {
                error!(error = %e, "Failed to save sensor data");
                Self::Internal(String::from("Failed to save sensor data"))
            }
            other => {
                error!(error = %other, "Store error");
                Self::Internal(String::from("Failed to access sensor data"))
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "code": status.as_u16(),
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
