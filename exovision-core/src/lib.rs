//! # Exovision Core
//!
//! Core library for the Exovision prediction service.
//! Provides the Kepler Object of Interest feature schema, model artifact
//! loading with hot reload, prediction, CSV upload parsing, configuration,
//! and the axum HTTP gateway.

pub mod config;
pub mod error;
pub mod features;
pub mod gateway;
pub mod model;
pub mod predictor;
pub mod upload;

// Re-export commonly used types at the crate root.
pub use config::{ExovisionConfig, MAX_BATCH_LIMIT, load_config};
pub use error::{ConfigError, ExovisionError, Result};
pub use features::{FeatureNormalizer, FeatureRecord, RecordSchema};
pub use gateway::{GatewayServer, SharedGateway, gateway_router, run_gateway};
pub use model::{ModelHandle, ModelInfo, ModelStore};
pub use predictor::{Prediction, PredictionResult, Predictor};
