//! Configuration system for Exovision.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! explicit config file -> environment. CLI flags are applied by the binary on
//! top of the extracted value.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Hard ceiling on batch and upload sizes.
pub const MAX_BATCH_LIMIT: usize = 1000;

/// Top-level configuration for the Exovision service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExovisionConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted size of a multipart upload body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Where the model artifact lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the JSON model artifact.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
    /// Feature-name sidecar; defaults to `feature_names.txt` next to the artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_path: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            feature_names_path: None,
        }
    }
}

impl ModelConfig {
    /// Resolved location of the feature-name sidecar file.
    pub fn feature_names_path(&self) -> PathBuf {
        match &self.feature_names_path {
            Some(path) => path.clone(),
            None => self
                .artifact_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("feature_names.txt"),
        }
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("models/baseline.json")
}

/// Prediction behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Largest accepted batch (and CSV row count).
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Positive-class probability above which the label is 1.
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            decision_threshold: default_decision_threshold(),
        }
    }
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_LIMIT
}

fn default_decision_threshold() -> f64 {
    0.5
}

/// Per-feature default and scale overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Value substituted when a feature is absent. Wins over artifact fill values.
    #[serde(default)]
    pub defaults: BTreeMap<String, f64>,
    /// Multiplier applied to a provided value (e.g. `koi_depth = 1e6` for ratio inputs).
    #[serde(default)]
    pub scales: BTreeMap<String, f64>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily-rolling JSON logs. Disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ExovisionConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.prediction.max_batch_size;
        if max == 0 || max > MAX_BATCH_LIMIT {
            return Err(ConfigError::Invalid {
                message: format!(
                    "prediction.max_batch_size must be in 1..={}, got {}",
                    MAX_BATCH_LIMIT, max
                ),
            });
        }

        let threshold = self.prediction.decision_threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "prediction.decision_threshold must be in (0, 1), got {}",
                    threshold
                ),
            });
        }

        for (name, value) in &self.features.defaults {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    message: format!("features.defaults.{} must be finite", name),
                });
            }
        }

        for (name, value) in &self.features.scales {
            if !value.is_finite() || *value == 0.0 {
                return Err(ConfigError::Invalid {
                    message: format!("features.scales.{} must be finite and non-zero", name),
                });
            }
        }

        Ok(())
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `EXOVISION_`, `__` separates sections)
/// 2. Explicit config file (`--config`)
/// 3. User config (`~/.config/exovision/config.toml`)
/// 4. Built-in defaults
pub fn load_config(config_file: Option<&Path>) -> Result<ExovisionConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ExovisionConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "exovision", "exovision") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::Invalid {
                message: format!("config file not found: {}", path.display()),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // EXOVISION_SERVER__PORT, EXOVISION_MODEL__ARTIFACT_PATH, etc.
    figment = figment.merge(Env::prefixed("EXOVISION_").split("__"));

    let config: ExovisionConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}
