use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use exovision_core::config::{FeaturesConfig, PredictionConfig};
use exovision_core::features::{FeatureRecord, RecordSchema};
use exovision_core::model::{ModelArtifact, ModelHandle, ModelStore};
use exovision_core::predictor::Predictor;
use exovision_core::upload::parse_csv;

const BASELINE: &str = include_str!("../../models/baseline.json");

fn baseline_predictor() -> Predictor {
    let artifact = ModelArtifact::from_json_str(BASELINE).expect("baseline artifact parses");
    let handle = ModelHandle::from_artifact(
        artifact,
        None,
        &FeaturesConfig::default(),
        Path::new("models/baseline.json"),
    )
    .expect("baseline artifact is valid");
    let store = Arc::new(ModelStore::new(Default::default(), Default::default()));
    store.install(handle);
    Predictor::new(store, &PredictionConfig::default())
}

fn sample_body() -> serde_json::Value {
    json!({
        "kepid": 10797460,
        "koi_period": 9.488,
        "koi_depth": 615.8,
        "koi_duration": 2.958,
        "koi_impact": 0.146,
        "koi_model_snr": 35.8,
        "koi_steff": 5455.0,
        "koi_slogg": 4.467,
        "koi_srad": 0.927,
        "koi_kepmag": 15.347,
        "ra": 291.934,
        "dec": 48.142
    })
}

fn bench_single_prediction(c: &mut Criterion) {
    let predictor = baseline_predictor();
    let body = sample_body();
    let record = FeatureRecord::from_json(&body, RecordSchema::Extended).expect("valid record");

    c.bench_function("parse_extended_record", |b| {
        b.iter(|| FeatureRecord::from_json(black_box(&body), RecordSchema::Extended))
    });

    c.bench_function("predict_single_record", |b| {
        b.iter(|| predictor.predict_record(black_box(&record)))
    });
}

fn bench_batch_prediction(c: &mut Criterion) {
    let predictor = baseline_predictor();
    let body = sample_body();
    let records: Vec<_> = (0..1000)
        .map(|_| FeatureRecord::from_json(&body, RecordSchema::Open).expect("valid record"))
        .collect();

    c.bench_function("predict_batch_1000", |b| {
        b.iter(|| predictor.predict_records(black_box(&records)))
    });

    let mut csv = String::from("kepid,koi_period,koi_depth,koi_duration,koi_steff\n");
    for i in 0..1000 {
        csv.push_str(&format!("{},{}.5,615.8,2.958,5455\n", 10_000_000 + i, i % 400));
    }
    c.bench_function("parse_csv_1000_rows", |b| {
        b.iter(|| parse_csv(black_box(csv.as_bytes()), 1000))
    });
}

criterion_group!(benches, bench_single_prediction, bench_batch_prediction);
criterion_main!(benches);
