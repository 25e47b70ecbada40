//! Process-wide model handle with atomic reload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use super::artifact::{Classifier, ModelArtifact, StandardScaler, parse_feature_names};
use crate::config::{FeaturesConfig, ModelConfig};
use crate::error::{ExovisionError, Result};
use crate::features::{FeatureNormalizer, FeatureRecord, unresolved_features};

/// A fully validated, immutable loaded model.
#[derive(Debug)]
pub struct ModelHandle {
    classifier: Classifier,
    feature_names: Vec<String>,
    scaler: Option<StandardScaler>,
    normalizer: FeatureNormalizer,
    artifact_path: PathBuf,
    loaded_at: DateTime<Utc>,
}

impl ModelHandle {
    /// Read the artifact (and, if needed, the feature-name sidecar) from disk.
    pub fn load(model: &ModelConfig, features: &FeaturesConfig) -> Result<Self> {
        let artifact = ModelArtifact::from_file(&model.artifact_path)?;

        let sidecar = if artifact.feature_names.is_empty() {
            let path = model.feature_names_path();
            match std::fs::read_to_string(&path) {
                Ok(content) => Some(parse_feature_names(&content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ExovisionError::model_invalid(format!(
                        "artifact lists no feature_names and {} does not exist",
                        path.display()
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            None
        };

        Self::from_artifact(artifact, sidecar, features, &model.artifact_path)
    }

    /// Validate an already parsed artifact and build the handle.
    pub fn from_artifact(
        artifact: ModelArtifact,
        sidecar_names: Option<Vec<String>>,
        features: &FeaturesConfig,
        artifact_path: &Path,
    ) -> Result<Self> {
        let ModelArtifact {
            classifier,
            feature_names,
            fill_values,
            scaler,
        } = artifact;

        let feature_names = if feature_names.is_empty() {
            sidecar_names.unwrap_or_default()
        } else {
            feature_names
        };

        if feature_names.is_empty() {
            return Err(ExovisionError::model_invalid("model has no feature names"));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = feature_names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ExovisionError::model_invalid(format!(
                "duplicate feature name '{}'",
                dup
            )));
        }

        let n_features = feature_names.len();
        classifier.validate(n_features)?;
        if let Some(scaler) = &scaler {
            scaler.validate(n_features)?;
        }
        if let Some((name, _)) = fill_values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ExovisionError::model_invalid(format!(
                "fill value for '{}' is not finite",
                name
            )));
        }

        let unresolved = unresolved_features(&feature_names);
        if !unresolved.is_empty() {
            warn!(
                features = ?unresolved,
                "Model expects features that requests cannot supply; defaults will be used"
            );
        }

        let normalizer = FeatureNormalizer::new(features).with_fill_values(&fill_values);

        Ok(Self {
            classifier,
            feature_names,
            scaler,
            normalizer,
            artifact_path: artifact_path.to_path_buf(),
            loaded_at: Utc::now(),
        })
    }

    pub fn model_type(&self) -> &'static str {
        self.classifier.model_type()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn normalizer(&self) -> &FeatureNormalizer {
        &self.normalizer
    }

    /// Map a record onto this model's ordered input vector.
    pub fn vectorize(&self, record: &FeatureRecord) -> Vec<f64> {
        self.normalizer.normalize(record, &self.feature_names)
    }

    /// Positive-class probability for a normalized vector.
    pub fn positive_probability(&self, vector: &[f64]) -> Result<f64> {
        if vector.len() != self.feature_count() {
            return Err(ExovisionError::FeatureCountMismatch {
                expected: self.feature_count(),
                got: vector.len(),
            });
        }

        let p = match &self.scaler {
            Some(scaler) => self.classifier.positive_probability(&scaler.transform(vector)),
            None => self.classifier.positive_probability(vector),
        };

        if p.is_nan() {
            return Err(ExovisionError::model_invalid(
                "model produced a non-finite score for this input",
            ));
        }
        Ok(p.clamp(0.0, 1.0))
    }

    /// Snapshot for the model info endpoint.
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            model_path: self.artifact_path.display().to_string(),
            model_type: self.model_type().to_string(),
            is_loaded: true,
            feature_count: Some(self.feature_count()),
            feature_names: self.feature_names.clone(),
            loaded_at: Some(self.loaded_at),
        }
    }
}

/// Model metadata as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_path: String,
    pub model_type: String,
    pub is_loaded: bool,
    pub feature_count: Option<usize>,
    pub feature_names: Vec<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Owns the current [`ModelHandle`] and swaps it on reload.
///
/// Readers clone the `Arc` under a short read lock and score without holding
/// it. A reload builds the new handle completely before taking the write lock,
/// so readers see either the old or the new model.
#[derive(Debug)]
pub struct ModelStore {
    model_config: ModelConfig,
    features_config: FeaturesConfig,
    current: RwLock<Option<Arc<ModelHandle>>>,
}

impl ModelStore {
    /// Create an empty store. Nothing is read until [`load`](Self::load).
    pub fn new(model_config: ModelConfig, features_config: FeaturesConfig) -> Self {
        Self {
            model_config,
            features_config,
            current: RwLock::new(None),
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.model_config.artifact_path
    }

    /// Load the artifact and install it. On failure the current handle is kept.
    pub fn load(&self) -> Result<Arc<ModelHandle>> {
        debug!(path = %self.artifact_path().display(), "Loading model artifact");
        match ModelHandle::load(&self.model_config, &self.features_config) {
            Ok(handle) => {
                let handle = self.install(handle);
                info!(
                    path = %handle.artifact_path().display(),
                    model_type = handle.model_type(),
                    features = handle.feature_count(),
                    "Model loaded"
                );
                Ok(handle)
            }
            Err(e) => {
                warn!(
                    path = %self.artifact_path().display(),
                    error = %e,
                    "Model load failed"
                );
                Err(e)
            }
        }
    }

    /// Re-read the artifact from disk. Same semantics as [`load`](Self::load).
    pub fn reload(&self) -> Result<Arc<ModelHandle>> {
        let had_model = self.is_loaded();
        let handle = self.load()?;
        info!(replaced = had_model, "Model reloaded");
        Ok(handle)
    }

    /// Swap in an already built handle.
    pub fn install(&self, handle: ModelHandle) -> Arc<ModelHandle> {
        let handle = Arc::new(handle);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&handle));
        handle
    }

    /// The current handle, if any.
    pub fn current(&self) -> Option<Arc<ModelHandle>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current handle or `ModelNotLoaded`.
    pub fn require(&self) -> Result<Arc<ModelHandle>> {
        self.current().ok_or(ExovisionError::ModelNotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Model info, including the not-loaded case.
    pub fn info(&self) -> ModelInfo {
        match self.current() {
            Some(handle) => handle.info(),
            None => ModelInfo {
                model_path: self.artifact_path().display().to_string(),
                model_type: "Unknown".to_string(),
                is_loaded: false,
                feature_count: None,
                feature_names: Vec::new(),
                loaded_at: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_artifact(dir: &Path, value: serde_json::Value) -> PathBuf {
        let path = dir.join("baseline.json");
        std::fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn stump_artifact(names: &[&str]) -> serde_json::Value {
        json!({
            "model_type": "XGBClassifier",
            "feature_names": names,
            "trees": [{"nodes": [
                {"split": {"feature": 0, "threshold": 10.0, "yes": 1, "no": 2}},
                {"leaf": {"value": -1.0}},
                {"leaf": {"value": 1.0}}
            ]}]
        })
    }

    fn store_for(path: PathBuf) -> ModelStore {
        ModelStore::new(
            ModelConfig {
                artifact_path: path,
                feature_names_path: None,
            },
            FeaturesConfig::default(),
        )
    }

    #[test]
    fn test_store_starts_empty() {
        let store = store_for(PathBuf::from("/nonexistent/baseline.json"));
        assert!(!store.is_loaded());
        assert!(matches!(store.require(), Err(ExovisionError::ModelNotLoaded)));
        let info = store.info();
        assert_eq!(info.model_type, "Unknown");
        assert!(!info.is_loaded);
        assert_eq!(info.feature_count, None);
    }

    #[test]
    fn test_load_missing_artifact() {
        let store = store_for(PathBuf::from("/nonexistent/baseline.json"));
        let err = store.load().unwrap_err();
        assert!(matches!(err, ExovisionError::ModelNotFound { .. }));
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_load_and_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), stump_artifact(&["koi_period", "koi_depth"]));
        let store = store_for(path.clone());

        let handle = store.load().unwrap();
        assert_eq!(handle.model_type(), "XGBClassifier");
        assert_eq!(handle.feature_count(), 2);

        let info = store.info();
        assert!(info.is_loaded);
        assert_eq!(info.feature_count, Some(2));
        assert_eq!(info.model_path, path.display().to_string());
    }

    #[test]
    fn test_sidecar_feature_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = stump_artifact(&[]);
        artifact.as_object_mut().unwrap().remove("feature_names");
        let path = write_artifact(dir.path(), artifact);
        std::fs::write(dir.path().join("feature_names.txt"), "koi_period\nkoi_steff\n").unwrap();

        let handle = store_for(path).load().unwrap();
        assert_eq!(handle.feature_names(), ["koi_period", "koi_steff"]);
    }

    #[test]
    fn test_no_feature_names_anywhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), stump_artifact(&[]));
        let err = store_for(path).load().unwrap_err();
        assert!(matches!(err, ExovisionError::ModelInvalid { .. }));
    }

    #[test]
    fn test_duplicate_feature_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), stump_artifact(&["koi_period", "koi_period"]));
        let err = store_for(path).load().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), stump_artifact(&["koi_period"]));
        let store = store_for(path.clone());
        let first = store.load().unwrap();

        std::fs::remove_file(&path).unwrap();
        let err = store.reload().unwrap_err();
        assert!(matches!(err, ExovisionError::ModelNotFound { .. }));

        let current = store.require().unwrap();
        assert!(Arc::ptr_eq(&first, &current));
    }

    #[test]
    fn test_reload_swaps_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), stump_artifact(&["koi_period"]));
        let store = store_for(path.clone());
        let first = store.load().unwrap();

        write_artifact(dir.path(), stump_artifact(&["koi_period", "koi_depth", "koi_steff"]));
        let second = store.reload().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.feature_count(), 1);
        assert_eq!(store.require().unwrap().feature_count(), 3);
    }

    #[test]
    fn test_positive_probability_checks_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), stump_artifact(&["koi_period", "koi_depth"]));
        let handle = store_for(path).load().unwrap();

        let err = handle.positive_probability(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ExovisionError::FeatureCountMismatch {
                expected: 2,
                got: 1
            }
        ));
        let p = handle.positive_probability(&[20.0, 0.0]).unwrap();
        assert!(p > 0.5);
    }

    #[test]
    fn test_fill_values_reach_normalizer() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = stump_artifact(&["koi_period", "koi_impact"]);
        artifact["fill_values"] = json!({"koi_impact": 0.53});
        let path = write_artifact(dir.path(), artifact);
        let handle = store_for(path).load().unwrap();

        let record = FeatureRecord::new().with("koi_period", 3.0).unwrap();
        assert_eq!(handle.vectorize(&record), vec![3.0, 0.53]);
    }
}
