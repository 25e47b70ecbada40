//! Error types for the Exovision core library.
//!
//! Uses `thiserror` for public API error types. Every variant maps to a stable
//! machine-readable code so the gateway can surface failures verbatim.

use std::path::PathBuf;

/// Top-level error type for the Exovision core library.
#[derive(Debug, thiserror::Error)]
pub enum ExovisionError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Model file not found at {}", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("Invalid model artifact: {message}")]
    ModelInvalid { message: String },

    #[error("Feature vector has {got} values, model expects {expected}")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("Invalid type for feature '{field}': expected a number, got {found}")]
    InvalidFeatureType { field: String, found: String },

    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    #[error("Feature '{field}' value {value} is outside the allowed range [{min}, {max}]")]
    FeatureOutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Batch size too large: {size} (max {max})")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Invalid request payload: {message}")]
    InvalidPayload { message: String },

    #[error("Invalid upload: {message}")]
    InvalidUpload { message: String },

    #[error("Request body too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExovisionError {
    /// Stable error code reported to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelNotLoaded => "MODEL_NOT_LOADED",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::ModelInvalid { .. } => "MODEL_INVALID",
            Self::FeatureCountMismatch { .. } => "FEATURE_COUNT_MISMATCH",
            Self::InvalidFeatureType { .. } => "INVALID_FEATURE_TYPE",
            Self::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            Self::FeatureOutOfRange { .. } => "FEATURE_OUT_OF_RANGE",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            Self::InvalidPayload { .. } => "INVALID_PAYLOAD",
            Self::InvalidUpload { .. } => "INVALID_UPLOAD",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::Config(_) | Self::Io(_) | Self::Serialization(_) => "INTERNAL",
        }
    }

    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFeatureType { .. }
                | Self::MissingRequiredField { .. }
                | Self::FeatureOutOfRange { .. }
                | Self::BatchTooLarge { .. }
                | Self::InvalidPayload { .. }
                | Self::InvalidUpload { .. }
                | Self::PayloadTooLarge { .. }
        )
    }

    pub fn model_invalid(msg: impl Into<String>) -> Self {
        Self::ModelInvalid {
            message: msg.into(),
        }
    }

    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: msg.into(),
        }
    }

    pub fn invalid_upload(msg: impl Into<String>) -> Self {
        Self::InvalidUpload {
            message: msg.into(),
        }
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: msg.into(),
        }
    }

    /// Prefix a field-level error with the batch row it came from.
    pub fn in_row(self, row: usize) -> Self {
        match self {
            Self::InvalidFeatureType { field, found } => Self::InvalidFeatureType {
                field: format!("row {}: {}", row, field),
                found,
            },
            Self::MissingRequiredField { field } => Self::MissingRequiredField {
                field: format!("row {}: {}", row, field),
            },
            Self::FeatureOutOfRange {
                field,
                value,
                min,
                max,
            } => Self::FeatureOutOfRange {
                field: format!("row {}: {}", row, field),
                value,
                min,
                max,
            },
            Self::InvalidPayload { message } => Self::InvalidPayload {
                message: format!("row {}: {}", row, message),
            },
            other => other,
        }
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `ExovisionError`.
pub type Result<T> = std::result::Result<T, ExovisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_batch_too_large() {
        let err = ExovisionError::BatchTooLarge {
            size: 1001,
            max: 1000,
        };
        assert_eq!(err.to_string(), "Batch size too large: 1001 (max 1000)");
        assert_eq!(err.code(), "BATCH_TOO_LARGE");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_display_payload_too_large() {
        let err = ExovisionError::payload_too_large("length limit exceeded");
        assert_eq!(err.to_string(), "Request body too large: length limit exceeded");
        assert_eq!(err.code(), "PAYLOAD_TOO_LARGE");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_display_model_not_found() {
        let err = ExovisionError::ModelNotFound {
            path: PathBuf::from("models/baseline.json"),
        };
        assert_eq!(
            err.to_string(),
            "Model file not found at models/baseline.json"
        );
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_error_display_invalid_type() {
        let err = ExovisionError::InvalidFeatureType {
            field: "koi_period".into(),
            found: "string".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid type for feature 'koi_period': expected a number, got string"
        );
    }

    #[test]
    fn test_in_row_prefixes_field_errors() {
        let err = ExovisionError::MissingRequiredField {
            field: "koi_depth".into(),
        }
        .in_row(3);
        assert_eq!(err.to_string(), "Missing required field: row 3: koi_depth");

        let err = ExovisionError::ModelNotLoaded.in_row(3);
        assert!(matches!(err, ExovisionError::ModelNotLoaded));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExovisionError = io_err.into();
        assert!(matches!(err, ExovisionError::Io(_)));
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn test_error_from_config() {
        let err: ExovisionError = ConfigError::Invalid {
            message: "port".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Configuration error: Invalid configuration: port");
    }
}
