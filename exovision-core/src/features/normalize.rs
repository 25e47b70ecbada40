//! Maps a partial [`FeatureRecord`] onto the ordered vector a model expects.

use std::collections::BTreeMap;

use super::derived::DerivedFeature;
use super::record::FeatureRecord;
use super::schema::field_spec;
use crate::config::FeaturesConfig;

/// Orders feature values for a specific model, filling gaps and applying scales.
///
/// Default resolution order: configured override, then the artifact's
/// documented fill value, then `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureNormalizer {
    defaults: BTreeMap<String, f64>,
    scales: BTreeMap<String, f64>,
}

impl FeatureNormalizer {
    pub fn new(config: &FeaturesConfig) -> Self {
        Self {
            defaults: config.defaults.clone(),
            scales: config.scales.clone(),
        }
    }

    /// Layer artifact fill values underneath the configured defaults.
    pub fn with_fill_values(mut self, fill_values: &BTreeMap<String, f64>) -> Self {
        for (name, value) in fill_values {
            self.defaults.entry(name.clone()).or_insert(*value);
        }
        self
    }

    /// Value used when `name` is absent.
    pub fn default_for(&self, name: &str) -> f64 {
        self.defaults.get(name).copied().unwrap_or(0.0)
    }

    fn scale_for(&self, name: &str) -> f64 {
        self.scales.get(name).copied().unwrap_or(1.0)
    }

    fn base_value(&self, record: &FeatureRecord, name: &str) -> f64 {
        match record.get(name) {
            Some(value) => value * self.scale_for(name),
            None => self.default_for(name),
        }
    }

    /// Resolve a single model feature for `record`.
    pub fn resolve(&self, record: &FeatureRecord, name: &str) -> f64 {
        if field_spec(name).is_some() {
            return self.base_value(record, name);
        }
        if let Some(derived) = DerivedFeature::from_name(name) {
            let value = derived.compute(|base| self.base_value(record, base));
            if value.is_finite() {
                return value;
            }
        }
        self.default_for(name)
    }

    /// Produce one value per required feature, in order. Never fails.
    pub fn normalize(&self, record: &FeatureRecord, required_features: &[String]) -> Vec<f64> {
        required_features
            .iter()
            .map(|name| self.resolve(record, name))
            .collect()
    }
}

/// Required names that are neither catalog fields nor derived features.
pub fn unresolved_features(required_features: &[String]) -> Vec<&str> {
    required_features
        .iter()
        .map(String::as_str)
        .filter(|name| field_spec(name).is_none() && DerivedFeature::from_name(name).is_none())
        .collect()
}
