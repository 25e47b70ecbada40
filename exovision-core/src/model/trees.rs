//! Decision-tree ensembles exported from XGBoost and scikit-learn.

use serde::{Deserialize, Serialize};

use crate::error::{ExovisionError, Result};

/// One node of a flattened tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Go to `yes` when `x[feature] < threshold`, otherwise to `no`.
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree stored as a node array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf and return its value.
    ///
    /// Children always have larger indices than their parent (checked by
    /// [`validate`](Self::validate)), so the walk terminates.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                }) => {
                    let value = x.get(*feature).copied().unwrap_or(0.0);
                    idx = if value < *threshold { *yes } else { *no };
                }
                None => return 0.0,
            }
        }
    }

    /// Structural checks against a model with `n_features` inputs.
    pub fn validate(&self, n_features: usize, tree_idx: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ExovisionError::model_invalid(format!(
                "tree {} has no nodes",
                tree_idx
            )));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ExovisionError::model_invalid(format!(
                            "tree {} node {}: leaf value is not finite",
                            tree_idx, idx
                        )));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                } => {
                    if *feature >= n_features {
                        return Err(ExovisionError::model_invalid(format!(
                            "tree {} node {}: feature index {} out of range (model has {} features)",
                            tree_idx, idx, feature, n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ExovisionError::model_invalid(format!(
                            "tree {} node {}: threshold is not finite",
                            tree_idx, idx
                        )));
                    }
                    for child in [yes, no] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(ExovisionError::model_invalid(format!(
                                "tree {} node {}: child index {} must be in ({}, {})",
                                tree_idx,
                                idx,
                                child,
                                idx,
                                self.nodes.len()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn leaves(&self) -> impl Iterator<Item = f64> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            Node::Leaf { value } => Some(*value),
            Node::Split { .. } => None,
        })
    }
}

/// Gradient-boosted trees with a logistic objective (`binary:logistic`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    /// Prior probability the margin starts from.
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

fn default_base_score() -> f64 {
    0.5
}

impl GradientBoostedTrees {
    pub fn positive_probability(&self, x: &[f64]) -> f64 {
        let margin = logit(self.base_score) + self.trees.iter().map(|t| t.evaluate(x)).sum::<f64>();
        sigmoid(margin)
    }

    pub fn validate(&self, n_features: usize) -> Result<()> {
        if !(self.base_score > 0.0 && self.base_score < 1.0) {
            return Err(ExovisionError::model_invalid(format!(
                "base_score must be in (0, 1), got {}",
                self.base_score
            )));
        }
        validate_trees(&self.trees, n_features)
    }
}

/// Random forest whose leaves hold the positive-class fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<Tree>,
}

impl RandomForest {
    pub fn positive_probability(&self, x: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.evaluate(x)).sum();
        (total / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    pub fn validate(&self, n_features: usize) -> Result<()> {
        validate_trees(&self.trees, n_features)?;
        for (idx, tree) in self.trees.iter().enumerate() {
            if tree.leaves().any(|v| !(0.0..=1.0).contains(&v)) {
                return Err(ExovisionError::model_invalid(format!(
                    "tree {}: random forest leaves must be probabilities in [0, 1]",
                    idx
                )));
            }
        }
        Ok(())
    }
}

fn validate_trees(trees: &[Tree], n_features: usize) -> Result<()> {
    if trees.is_empty() {
        return Err(ExovisionError::model_invalid("ensemble has no trees"));
    }
    for (idx, tree) in trees.iter().enumerate() {
        tree.validate(n_features, idx)?;
    }
    Ok(())
}

pub(crate) fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

pub(crate) fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
