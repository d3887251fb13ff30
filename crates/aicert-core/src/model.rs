//! Model capability facade.
//!
//! Checks see the model under evaluation only through the [`Model`] trait.
//! `predict` is mandatory; probability outputs and feature importances are
//! optional capabilities that checks must query with [`Model::supports`]
//! before relying on them.

use serde::{Deserialize, Serialize};

use crate::dataset::Label;
use crate::error::{CertError, ModelError};

/// Optional model capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// `predict_probabilities` returns one probability vector per row.
    Probabilities,
    /// `feature_importances` returns one weight per feature.
    FeatureImportances,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probabilities => write!(f, "probability outputs"),
            Self::FeatureImportances => write!(f, "feature importances"),
        }
    }
}

/// A trained classifier under evaluation.
pub trait Model {
    /// Predict one label per input row.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Label>, ModelError>;

    /// Whether the model exposes an optional capability.
    fn supports(&self, _capability: Capability) -> bool {
        false
    }

    /// Per-class probabilities, one vector per input row.
    fn predict_probabilities(&self, _features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        Err(ModelError::Unsupported(Capability::Probabilities))
    }

    /// Relative importance of each feature.
    fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Unsupported(Capability::FeatureImportances))
    }
}

impl<M: Model + ?Sized> Model for &M {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Label>, ModelError> {
        (**self).predict(features)
    }

    fn supports(&self, capability: Capability) -> bool {
        (**self).supports(capability)
    }

    fn predict_probabilities(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        (**self).predict_probabilities(features)
    }

    fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        (**self).feature_importances()
    }
}

/// Binary logistic-regression classifier.
///
/// Serves as the reference model for the CLI and tests: it implements every
/// capability. Importances are the normalized absolute weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default = "default_decision_threshold")]
    pub threshold: f64,
}

fn default_decision_threshold() -> f64 {
    0.5
}

impl LogisticModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self {
            weights,
            bias,
            threshold: default_decision_threshold(),
        }
    }

    /// Parse a model from its JSON form, validating the parameters.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.weights.is_empty() {
            return Err(CertError::InvalidModel("weights must not be empty".to_string()));
        }
        if self.weights.iter().any(|w| !w.is_finite()) || !self.bias.is_finite() {
            return Err(CertError::InvalidModel(
                "weights and bias must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(CertError::InvalidModel(format!(
                "decision threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Probability of the positive class for one row.
    fn positive_probability(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.weights.len() {
            return Err(ModelError::FeatureWidth {
                expected: self.weights.len(),
                actual: row.len(),
            });
        }
        let z: f64 = self
            .weights
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        Ok(sigmoid(z))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Model for LogisticModel {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Label>, ModelError> {
        features
            .iter()
            .map(|row| {
                let p = self.positive_probability(row)?;
                // NaN compares false, so a NaN input falls through to class 0.
                Ok(if p >= self.threshold { 1 } else { 0 })
            })
            .collect()
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    fn predict_probabilities(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        features
            .iter()
            .map(|row| {
                let p = self.positive_probability(row)?;
                Ok(vec![1.0 - p, p])
            })
            .collect()
    }

    fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        let total: f64 = self.weights.iter().map(|w| w.abs()).sum();
        if total == 0.0 {
            let n = self.weights.len() as f64;
            return Ok(vec![1.0 / n; self.weights.len()]);
        }
        Ok(self.weights.iter().map(|w| w.abs() / total).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PredictOnly;

    impl Model for PredictOnly {
        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Label>, ModelError> {
            Ok(vec![0; features.len()])
        }
    }

    #[test]
    fn test_default_capabilities_are_absent() {
        let m = PredictOnly;
        assert!(!m.supports(Capability::Probabilities));
        assert!(!m.supports(Capability::FeatureImportances));
        assert_eq!(
            m.predict_probabilities(&[vec![1.0]]),
            Err(ModelError::Unsupported(Capability::Probabilities))
        );
        assert_eq!(
            m.feature_importances(),
            Err(ModelError::Unsupported(Capability::FeatureImportances))
        );
    }

    #[test]
    fn test_logistic_predict_and_probabilities() {
        let m = LogisticModel::new(vec![1.0, -1.0], 0.0);
        let rows = vec![vec![2.0, 0.0], vec![0.0, 2.0]];
        assert_eq!(m.predict(&rows).unwrap(), vec![1, 0]);
        let probs = m.predict_probabilities(&rows).unwrap();
        assert!((probs[0][0] + probs[0][1] - 1.0).abs() < 1e-12);
        assert!(probs[0][1] > 0.8);
    }

    #[test]
    fn test_logistic_width_mismatch() {
        let m = LogisticModel::new(vec![1.0, 1.0], 0.0);
        let err = m.predict(&[vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            ModelError::FeatureWidth {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_logistic_handles_extreme_inputs() {
        let m = LogisticModel::new(vec![0.5, -0.25], 0.1);
        let probs = m
            .predict_probabilities(&[vec![1e10, 1e10], vec![-1e10, -1e10]])
            .unwrap();
        assert!(probs.iter().flatten().all(|p| p.is_finite()));
    }

    #[test]
    fn test_feature_importances_normalized() {
        let m = LogisticModel::new(vec![3.0, -1.0], 0.0);
        let imp = m.feature_importances().unwrap();
        assert_eq!(imp, vec![0.75, 0.25]);
    }

    #[test]
    fn test_from_json_validates() {
        let m = LogisticModel::from_json(r#"{"weights":[1.0,2.0],"bias":0.5}"#).unwrap();
        assert_eq!(m.threshold, 0.5);
        assert!(LogisticModel::from_json(r#"{"weights":[],"bias":0.0}"#).is_err());
        assert!(LogisticModel::from_json(r#"{"weights":[1.0],"bias":0.0,"threshold":2.0}"#).is_err());
    }
}
