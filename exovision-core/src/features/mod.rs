//! # Features
//!
//! The KOI field catalog, typed feature records, engineered features, and the
//! normalizer that turns a partial record into the vector a model expects.

pub mod derived;
pub mod normalize;
pub mod record;
pub mod schema;

pub use derived::DerivedFeature;
pub use normalize::{FeatureNormalizer, unresolved_features};
pub use record::FeatureRecord;
pub use schema::{FIELD_CATALOG, FieldSpec, KEPID_FIELD, RecordSchema, field_spec};
