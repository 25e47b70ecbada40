//! Scoring of normalized feature vectors against the loaded model.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{MAX_BATCH_LIMIT, PredictionConfig};
use crate::error::{ExovisionError, Result};
use crate::features::FeatureRecord;
use crate::model::{ModelHandle, ModelStore};

/// Label and confidence for one input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// 1 = confirmed planet, 0 = false positive.
    pub label: u8,
    /// Model probability of `label`: `p` for 1, `1 - p` for 0.
    pub probability: f64,
}

/// Client-facing result, with the catalog id passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: u8,
    pub probability: f64,
    pub kepid: Option<i64>,
}

impl PredictionResult {
    pub fn new(prediction: Prediction, kepid: Option<i64>) -> Self {
        Self {
            prediction: prediction.label,
            probability: prediction.probability,
            kepid,
        }
    }
}

/// Runs inference against whatever model the store currently holds.
///
/// Each call takes one snapshot of the handle, so a batch is always scored by
/// a single model even if a reload lands mid-request.
#[derive(Debug, Clone)]
pub struct Predictor {
    store: Arc<ModelStore>,
    decision_threshold: f64,
    max_batch_size: usize,
}

impl Predictor {
    pub fn new(store: Arc<ModelStore>, config: &PredictionConfig) -> Self {
        Self {
            store,
            decision_threshold: config.decision_threshold,
            max_batch_size: config.max_batch_size.min(MAX_BATCH_LIMIT),
        }
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Fail with `BatchTooLarge` if `size` exceeds the limit.
    pub fn check_batch_size(&self, size: usize) -> Result<()> {
        if size > self.max_batch_size {
            return Err(ExovisionError::BatchTooLarge {
                size,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }

    /// Score one normalized vector.
    pub fn predict(&self, vector: &[f64]) -> Result<Prediction> {
        let handle = self.store.require()?;
        self.score(&handle, vector)
    }

    /// Score many normalized vectors, in order.
    pub fn predict_batch(&self, vectors: &[Vec<f64>]) -> Result<Vec<Prediction>> {
        let handle = self.store.require()?;
        self.check_batch_size(vectors.len())?;
        vectors.iter().map(|v| self.score(&handle, v)).collect()
    }

    /// Normalize and score one record.
    pub fn predict_record(&self, record: &FeatureRecord) -> Result<PredictionResult> {
        let handle = self.store.require()?;
        self.score_record(&handle, record)
    }

    /// Normalize and score many records, in order.
    pub fn predict_records(&self, records: &[FeatureRecord]) -> Result<Vec<PredictionResult>> {
        let handle = self.store.require()?;
        self.check_batch_size(records.len())?;
        records
            .iter()
            .map(|record| self.score_record(&handle, record))
            .collect()
    }

    fn score_record(&self, handle: &ModelHandle, record: &FeatureRecord) -> Result<PredictionResult> {
        let vector = handle.vectorize(record);
        let prediction = self.score(handle, &vector)?;
        Ok(PredictionResult::new(prediction, record.kepid))
    }

    fn score(&self, handle: &ModelHandle, vector: &[f64]) -> Result<Prediction> {
        let p = handle.positive_probability(vector)?;
        Ok(self.decide(p))
    }

    /// Turn a positive-class probability into a label and its confidence.
    pub fn decide(&self, positive_probability: f64) -> Prediction {
        let label = u8::from(positive_probability > self.decision_threshold);
        let probability = if label == 1 {
            positive_probability
        } else {
            1.0 - positive_probability
        };
        Prediction { label, probability }
    }
}
