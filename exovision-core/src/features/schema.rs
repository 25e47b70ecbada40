//! Field catalog and per-endpoint record schemas.

use serde::Serialize;

/// Name of the pass-through catalog identifier.
pub const KEPID_FIELD: &str = "kepid";

/// A known KOI input field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Inclusive lower bound, if the field has one.
    pub min: Option<f64>,
    /// Inclusive upper bound, if the field has one.
    pub max: Option<f64>,
}

impl FieldSpec {
    const fn unbounded(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            min: None,
            max: None,
        }
    }

    const fn non_negative(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            min: Some(0.0),
            max: None,
        }
    }

    const fn bounded(name: &'static str, description: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            description,
            min: Some(min),
            max: Some(max),
        }
    }

    /// Whether `value` lies inside the declared range.
    pub fn in_range(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// The eleven KOI fields, in training column order.
pub const FIELD_CATALOG: [FieldSpec; 11] = [
    FieldSpec::non_negative("koi_period", "Orbital Period [days]"),
    FieldSpec::non_negative("koi_depth", "Transit Depth [ppm]"),
    FieldSpec::non_negative("koi_duration", "Transit Duration [hours]"),
    FieldSpec::non_negative("koi_impact", "Impact Parameter"),
    FieldSpec::unbounded("koi_model_snr", "Signal-to-Noise Ratio"),
    FieldSpec::non_negative("koi_steff", "Stellar Effective Temperature [K]"),
    FieldSpec::unbounded("koi_slogg", "Stellar Surface Gravity [log10(cm/s**2)]"),
    FieldSpec::non_negative("koi_srad", "Stellar Radius [Solar radii]"),
    FieldSpec::unbounded("koi_kepmag", "Kepler-band [mag]"),
    FieldSpec::bounded("ra", "Right Ascension [decimal degrees]", 0.0, 360.0),
    FieldSpec::bounded("dec", "Declination [decimal degrees]", -90.0, 90.0),
];

/// Look up a catalog field by name.
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELD_CATALOG.iter().find(|spec| spec.name == name)
}

const SIMPLE_REQUIRED: [&str; 4] = ["koi_period", "koi_depth", "koi_duration", "koi_steff"];

const EXTENDED_REQUIRED: [&str; 11] = [
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

/// Which catalog fields an endpoint insists on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSchema {
    /// Four-field slider input.
    Simple,
    /// All eleven catalog fields.
    Extended,
    /// Every field optional (batch rows, CSV rows).
    Open,
}

impl RecordSchema {
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Simple => &SIMPLE_REQUIRED,
            Self::Extended => &EXTENDED_REQUIRED,
            Self::Open => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_training_columns() {
        let names: Vec<_> = FIELD_CATALOG.iter().map(|f| f.name).collect();
        assert_eq!(names, EXTENDED_REQUIRED.to_vec());
    }

    #[test]
    fn test_field_spec_lookup() {
        assert_eq!(field_spec("koi_steff").unwrap().description, "Stellar Effective Temperature [K]");
        assert!(field_spec("koi_disposition").is_none());
        assert!(field_spec(KEPID_FIELD).is_none());
    }

    #[test]
    fn test_ranges() {
        let ra = field_spec("ra").unwrap();
        assert!(ra.in_range(0.0));
        assert!(ra.in_range(360.0));
        assert!(!ra.in_range(360.5));

        let period = field_spec("koi_period").unwrap();
        assert!(period.in_range(1e9));
        assert!(!period.in_range(-1.0));

        let slogg = field_spec("koi_slogg").unwrap();
        assert!(slogg.in_range(-3.0));
    }

    #[test]
    fn test_schema_required_fields() {
        assert_eq!(RecordSchema::Simple.required_fields().len(), 4);
        assert_eq!(RecordSchema::Extended.required_fields().len(), 11);
        assert!(RecordSchema::Open.required_fields().is_empty());
    }
}
