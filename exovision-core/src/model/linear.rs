//! Logistic regression.

use serde::{Deserialize, Serialize};

use super::trees::sigmoid;
use crate::error::{ExovisionError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn positive_probability(&self, x: &[f64]) -> f64 {
        let margin = self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .sum::<f64>();
        sigmoid(margin)
    }

    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.coefficients.len() != n_features {
            return Err(ExovisionError::model_invalid(format!(
                "logistic regression has {} coefficients for {} features",
                self.coefficients.len(),
                n_features
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ExovisionError::model_invalid(
                "logistic regression weights must be finite",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability() {
        let model = LogisticRegression {
            coefficients: vec![1.0, -1.0],
            intercept: 0.0,
        };
        assert!((model.positive_probability(&[2.0, 2.0]) - 0.5).abs() < 1e-12);
        assert!(model.positive_probability(&[5.0, 0.0]) > 0.99);
        assert!(model.positive_probability(&[0.0, 5.0]) < 0.01);
    }

    #[test]
    fn test_validate_coefficient_count() {
        let model = LogisticRegression {
            coefficients: vec![1.0],
            intercept: 0.0,
        };
        assert!(model.validate(1).is_ok());
        assert!(model.validate(2).is_err());
    }

    #[test]
    fn test_extreme_margin_stays_in_unit_interval() {
        let model = LogisticRegression {
            coefficients: vec![1e6],
            intercept: 0.0,
        };
        let high = model.positive_probability(&[1e6]);
        let low = model.positive_probability(&[-1e6]);
        assert!((0.0..=1.0).contains(&high));
        assert!((0.0..=1.0).contains(&low));
    }
}
