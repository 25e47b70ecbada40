//! On-disk model artifact format.
//!
//! The artifact is the JSON export of a trained binary classifier. The
//! `model_type` tag selects the scoring rule; the remaining keys carry the
//! expected feature order, optional training fill values, and an optional
//! standard scaler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::linear::LogisticRegression;
use super::trees::{GradientBoostedTrees, RandomForest};
use crate::error::{ExovisionError, Result};

/// A binary classifier that yields the positive-class probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type")]
pub enum Classifier {
    #[serde(rename = "XGBClassifier")]
    GradientBoosted(GradientBoostedTrees),
    #[serde(rename = "RandomForestClassifier")]
    RandomForest(RandomForest),
    #[serde(rename = "LogisticRegression")]
    Logistic(LogisticRegression),
}

impl Classifier {
    /// Name reported by the model info endpoint.
    pub fn model_type(&self) -> &'static str {
        match self {
            Self::GradientBoosted(_) => "XGBClassifier",
            Self::RandomForest(_) => "RandomForestClassifier",
            Self::Logistic(_) => "LogisticRegression",
        }
    }

    pub fn positive_probability(&self, x: &[f64]) -> f64 {
        match self {
            Self::GradientBoosted(model) => model.positive_probability(x),
            Self::RandomForest(model) => model.positive_probability(x),
            Self::Logistic(model) => model.positive_probability(x),
        }
    }

    pub fn validate(&self, n_features: usize) -> Result<()> {
        match self {
            Self::GradientBoosted(model) => model.validate(n_features),
            Self::RandomForest(model) => model.validate(n_features),
            Self::Logistic(model) => model.validate(n_features),
        }
    }
}

/// Per-feature standardization `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect()
    }

    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.mean.len() != n_features || self.scale.len() != n_features {
            return Err(ExovisionError::model_invalid(format!(
                "scaler has {} means and {} scales for {} features",
                self.mean.len(),
                self.scale.len(),
                n_features
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite())
            || self.scale.iter().any(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ExovisionError::model_invalid(
                "scaler entries must be finite and scales non-zero",
            ));
        }
        Ok(())
    }
}

/// Deserialized contents of a model artifact file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(flatten)]
    pub classifier: Classifier,
    /// Expected input order. Empty means "read the sidecar file".
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Training fill values (medians) for absent features.
    #[serde(default)]
    pub fill_values: BTreeMap<String, f64>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
}

impl ModelArtifact {
    /// Read and parse an artifact. A missing file is `ModelNotFound`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExovisionError::ModelNotFound {
                path: path.to_path_buf(),
            },
            _ => ExovisionError::Io(e),
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            ExovisionError::model_invalid(format!("cannot parse model artifact: {}", e))
        })
    }
}

/// Parse a `feature_names.txt` sidecar: one name per line, blanks skipped.
pub fn parse_feature_names(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
