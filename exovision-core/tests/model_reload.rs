//! Concurrent readers against a store that keeps swapping models.

use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use exovision_core::config::{FeaturesConfig, ModelConfig, PredictionConfig};
use exovision_core::features::FeatureRecord;
use exovision_core::model::{ModelArtifact, ModelHandle, ModelStore};
use exovision_core::predictor::Predictor;

fn handle_with_features(names: &[&str]) -> ModelHandle {
    let artifact = json!({
        "model_type": "LogisticRegression",
        "coefficients": vec![0.01; names.len()],
        "intercept": -0.2,
        "feature_names": names,
    });
    ModelHandle::from_artifact(
        ModelArtifact::from_json_str(&artifact.to_string()).unwrap(),
        None,
        &FeaturesConfig::default(),
        Path::new("memory.json"),
    )
    .unwrap()
}

#[test]
fn test_readers_always_see_a_complete_handle() {
    let store = Arc::new(ModelStore::new(
        ModelConfig::default(),
        FeaturesConfig::default(),
    ));
    let small = ["koi_period", "koi_depth", "koi_duration", "koi_steff"];
    let large = [
        "koi_period",
        "koi_depth",
        "koi_duration",
        "koi_impact",
        "koi_model_snr",
        "koi_steff",
        "koi_slogg",
        "koi_srad",
        "koi_kepmag",
        "ra",
        "dec",
    ];
    store.install(handle_with_features(&small));

    let stop = Arc::new(AtomicBool::new(false));
    let record = FeatureRecord::new()
        .with("koi_period", 9.488)
        .unwrap()
        .with("koi_depth", 615.8)
        .unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            let record = record.clone();
            thread::spawn(move || {
                let predictor = Predictor::new(Arc::clone(&store), &PredictionConfig::default());
                let mut served = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let handle = store.require().unwrap();
                    let vector = handle.vectorize(&record);
                    assert_eq!(vector.len(), handle.feature_count());
                    assert!(handle.feature_count() == 4 || handle.feature_count() == 11);
                    handle.positive_probability(&vector).unwrap();

                    let result = predictor.predict_record(&record).unwrap();
                    assert!(result.prediction <= 1);
                    served += 1;
                }
                served
            })
        })
        .collect();

    for i in 0..500 {
        if i % 2 == 0 {
            store.install(handle_with_features(&large));
        } else {
            store.install(handle_with_features(&small));
        }
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().unwrap();
    }
    assert!(store.is_loaded());
}

#[test]
fn test_failed_reload_keeps_serving() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.json");
    let config = ModelConfig {
        artifact_path: path.clone(),
        feature_names_path: None,
    };
    let store = Arc::new(ModelStore::new(config, FeaturesConfig::default()));
    std::fs::write(
        &path,
        json!({
            "model_type": "LogisticRegression",
            "coefficients": [0.5],
            "intercept": 0.0,
            "feature_names": ["koi_period"],
        })
        .to_string(),
    )
    .unwrap();
    let first = store.load().unwrap();

    std::fs::write(&path, r#"{"model_type": "LogisticRegression", "coefficients": [1.0, 2.0], "feature_names": ["koi_period"]}"#).unwrap();
    assert!(store.reload().is_err());

    let current = store.require().unwrap();
    assert!(Arc::ptr_eq(&first, &current));
}
