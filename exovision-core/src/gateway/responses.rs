//! JSON response bodies and the error-to-HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::ExovisionError;
use crate::predictor::PredictionResult;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub message: &'static str,
    pub model_type: &'static str,
    pub feature_count: usize,
}

#[derive(Debug, Serialize)]
pub struct BatchPredictionResponse {
    pub predictions: Vec<PredictionResult>,
    pub total_samples: usize,
}

#[derive(Debug, Serialize)]
pub struct FilePredictionResponse {
    pub predictions: Vec<PredictionResult>,
    pub total_samples: usize,
    pub filename: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    code: &'static str,
}

/// An [`ExovisionError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub ExovisionError);

impl From<ExovisionError> for ApiError {
    fn from(err: ExovisionError) -> Self {
        Self(err)
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &ExovisionError) -> StatusCode {
    match err {
        ExovisionError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
        ExovisionError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "Request failed");
        } else {
            warn!(code = self.0.code(), error = %self.0, "Request rejected");
        }
        let body = ErrorBody {
            detail: self.0.to_string(),
            code: self.0.code(),
        };
        (status, Json(body)).into_response()
    }
}
