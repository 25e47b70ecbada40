//! Route handlers for the prediction API.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::SharedGateway;
use super::responses::{
    ApiError, BatchPredictionResponse, FilePredictionResponse, HealthResponse, ReloadResponse,
    RootResponse,
};
use crate::error::ExovisionError;
use crate::features::{FeatureRecord, RecordSchema};
use crate::model::ModelInfo;
use crate::predictor::PredictionResult;
use crate::upload::{is_csv_filename, parse_csv};

type ApiResult<T> = Result<Json<T>, ApiError>;

const UPLOAD_FIELD: &str = "file";

/// Body-limit failures keep their 413; anything else becomes `otherwise`.
fn body_error(
    status: StatusCode,
    text: String,
    otherwise: fn(String) -> ExovisionError,
) -> ExovisionError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ExovisionError::payload_too_large(text)
    } else {
        otherwise(text)
    }
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ExovisionError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        body_error(
            rejection.status(),
            rejection.body_text(),
            ExovisionError::invalid_payload,
        )
    })
}

fn upload_error(status: StatusCode, text: String) -> ExovisionError {
    body_error(status, text, ExovisionError::invalid_upload)
}

pub(super) async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Exoplanet Classification API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "GET /health",
            "GET /model/info",
            "POST /model/reload",
            "POST /predict",
            "POST /predict/extended",
            "POST /predict/batch",
            "POST /predict/file",
        ],
    })
}

pub(super) async fn health(State(gw): State<SharedGateway>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: gw.store().is_loaded(),
    })
}

pub(super) async fn model_info(State(gw): State<SharedGateway>) -> Json<ModelInfo> {
    Json(gw.store().info())
}

pub(super) async fn reload_model(State(gw): State<SharedGateway>) -> ApiResult<ReloadResponse> {
    let store = Arc::clone(gw.store());
    let handle = tokio::task::spawn_blocking(move || store.reload())
        .await
        .map_err(|e| ExovisionError::Io(std::io::Error::other(e.to_string())))??;

    Ok(Json(ReloadResponse {
        message: "Model reloaded successfully",
        model_type: handle.model_type(),
        feature_count: handle.feature_count(),
    }))
}

fn predict_with_schema(
    gw: &SharedGateway,
    payload: Result<Json<Value>, JsonRejection>,
    schema: RecordSchema,
) -> ApiResult<PredictionResult> {
    let predictor = gw.predictor();
    predictor.store().require()?;
    let body = json_body(payload)?;
    let record = FeatureRecord::from_json(&body, schema)?;
    let result = predictor.predict_record(&record)?;
    debug!(
        kepid = ?result.kepid,
        prediction = result.prediction,
        probability = result.probability,
        "Prediction served"
    );
    Ok(Json(result))
}

pub(super) async fn predict(
    State(gw): State<SharedGateway>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<PredictionResult> {
    predict_with_schema(&gw, payload, RecordSchema::Simple)
}

pub(super) async fn predict_extended(
    State(gw): State<SharedGateway>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<PredictionResult> {
    predict_with_schema(&gw, payload, RecordSchema::Extended)
}

pub(super) async fn predict_batch(
    State(gw): State<SharedGateway>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<BatchPredictionResponse> {
    let predictor = gw.predictor();
    predictor.store().require()?;

    let body = json_body(payload)?;
    let rows = body.as_array().ok_or_else(|| {
        ExovisionError::invalid_payload("expected a JSON array of feature records")
    })?;
    predictor.check_batch_size(rows.len())?;

    let records = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            FeatureRecord::from_json(row, RecordSchema::Open).map_err(|e| e.in_row(idx))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let predictions = predictor.predict_records(&records)?;
    info!(total = predictions.len(), "Batch prediction served");
    Ok(Json(BatchPredictionResponse {
        total_samples: predictions.len(),
        predictions,
    }))
}

pub(super) async fn predict_file(
    State(gw): State<SharedGateway>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<FilePredictionResponse> {
    let predictor = gw.predictor();
    predictor.store().require()?;

    let mut multipart = multipart
        .map_err(|rejection| upload_error(rejection.status(), rejection.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e.status(), e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if !is_csv_filename(&filename) {
            return Err(ExovisionError::invalid_upload("File must be a CSV").into());
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(e.status(), e.body_text()))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        ExovisionError::invalid_upload(format!("multipart field '{}' is required", UPLOAD_FIELD))
    })?;

    let records = parse_csv(&bytes, predictor.max_batch_size())?;
    let predictions = predictor.predict_records(&records)?;
    info!(
        filename = %filename,
        total = predictions.len(),
        "File prediction served"
    );

    Ok(Json(FilePredictionResponse {
        total_samples: predictions.len(),
        predictions,
        filename,
    }))
}
