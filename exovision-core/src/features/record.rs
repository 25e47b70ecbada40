//! Typed feature records built from JSON bodies and CSV rows.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::schema::{KEPID_FIELD, RecordSchema, field_spec};
use crate::error::{ExovisionError, Result};

/// Cell tokens treated as missing in CSV uploads.
const MISSING_TOKENS: [&str; 6] = ["", "nan", "na", "n/a", "null", "none"];

/// A validated set of KOI feature values plus an optional catalog id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub kepid: Option<i64>,
    values: BTreeMap<String, f64>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kepid(mut self, kepid: i64) -> Self {
        self.kepid = Some(kepid);
        self
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: &str, value: f64) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Store a catalog field value after type and range checks.
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let spec = field_spec(name)
            .ok_or_else(|| ExovisionError::invalid_payload(format!("unknown feature '{}'", name)))?;

        if !value.is_finite() {
            return Err(ExovisionError::InvalidFeatureType {
                field: name.to_string(),
                found: "non-finite number".to_string(),
            });
        }

        if !spec.in_range(value) {
            return Err(ExovisionError::FeatureOutOfRange {
                field: name.to_string(),
                value,
                min: spec.min.unwrap_or(f64::NEG_INFINITY),
                max: spec.max.unwrap_or(f64::INFINITY),
            });
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail with `MissingRequiredField` for the first required field not present.
    pub fn check_required(&self, schema: RecordSchema) -> Result<()> {
        match schema
            .required_fields()
            .iter()
            .find(|name| !self.contains(name))
        {
            Some(name) => Err(ExovisionError::MissingRequiredField {
                field: (*name).to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Build a record from a JSON object body.
    ///
    /// `null` counts as absent. Keys outside the catalog are ignored.
    pub fn from_json(value: &Value, schema: RecordSchema) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            ExovisionError::invalid_payload(format!(
                "expected a JSON object, got {}",
                json_type_name(value)
            ))
        })?;

        let mut record = Self::new();
        for (key, raw) in map {
            if raw.is_null() {
                continue;
            }
            if key == KEPID_FIELD {
                record.kepid = Some(kepid_from_json(raw)?);
                continue;
            }
            if field_spec(key).is_none() {
                debug!(field = %key, "Ignoring unknown field");
                continue;
            }
            let number = raw.as_f64().ok_or_else(|| ExovisionError::InvalidFeatureType {
                field: key.clone(),
                found: json_type_name(raw).to_string(),
            })?;
            record.set(key, number)?;
        }

        record.check_required(schema)?;
        Ok(record)
    }

    /// Build a record from one CSV row given its header.
    pub fn from_csv_row<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        cells: impl IntoIterator<Item = &'a str>,
        schema: RecordSchema,
    ) -> Result<Self> {
        let mut record = Self::new();
        for (header, cell) in headers.into_iter().zip(cells) {
            let header = header.trim();
            let cell = cell.trim();
            if is_missing_cell(cell) {
                continue;
            }
            if header == KEPID_FIELD {
                record.kepid = Some(kepid_from_str(cell)?);
                continue;
            }
            if field_spec(header).is_none() {
                continue;
            }
            let number: f64 = cell.parse().map_err(|_| ExovisionError::InvalidFeatureType {
                field: header.to_string(),
                found: format!("'{}'", cell),
            })?;
            record.set(header, number)?;
        }

        record.check_required(schema)?;
        Ok(record)
    }
}

fn is_missing_cell(cell: &str) -> bool {
    MISSING_TOKENS
        .iter()
        .any(|token| cell.eq_ignore_ascii_case(token))
}

fn kepid_from_json(raw: &Value) -> Result<i64> {
    if let Some(id) = raw.as_i64() {
        return Ok(id);
    }
    raw.as_f64()
        .and_then(integral_id)
        .ok_or_else(|| ExovisionError::InvalidFeatureType {
            field: KEPID_FIELD.to_string(),
            found: describe_bad_id(raw),
        })
}

fn kepid_from_str(cell: &str) -> Result<i64> {
    if let Ok(id) = cell.parse::<i64>() {
        return Ok(id);
    }
    cell.parse::<f64>()
        .ok()
        .and_then(integral_id)
        .ok_or_else(|| ExovisionError::InvalidFeatureType {
            field: KEPID_FIELD.to_string(),
            found: format!("'{}'", cell),
        })
}

// Pandas reads integer columns with gaps as floats, so 10797460.0 is a valid id.
fn integral_id(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn describe_bad_id(raw: &Value) -> String {
    match raw {
        Value::Number(n) => format!("non-integer number {}", n),
        other => json_type_name(other).to_string(),
    }
}

/// Human-readable JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
