//! # Model
//!
//! Model artifact parsing, the supported classifier families, and the
//! process-wide [`ModelStore`] that owns the loaded handle.

pub mod artifact;
pub mod linear;
pub mod store;
pub mod trees;

pub use artifact::{Classifier, ModelArtifact, StandardScaler, parse_feature_names};
pub use linear::LogisticRegression;
pub use store::{ModelHandle, ModelInfo, ModelStore};
pub use trees::{GradientBoostedTrees, Node, RandomForest, Tree};
