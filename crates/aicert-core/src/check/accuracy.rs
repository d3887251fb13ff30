//! Minimum prediction accuracy.

use serde_json::json;

use super::{details, CheckMeta, CheckOutcome, ValidationCheck};
use crate::dataset::Dataset;
use crate::error::{CertError, CheckError, Result};
use crate::model::Model;
use crate::stats;

pub const NAME: &str = "Accuracy Validation";
pub const CATEGORY: &str = "Performance";

/// Passes when accuracy `a >= min_accuracy`; scores `min(100, 100·a/min_accuracy)`.
#[derive(Debug, Clone)]
pub struct AccuracyCheck {
    meta: CheckMeta,
    min_accuracy: f64,
}

impl AccuracyCheck {
    /// Check that passes at `min_accuracy`, which must lie in `(0, 1]`.
    pub fn new(min_accuracy: f64, weight: f64) -> Result<Self> {
        if !(min_accuracy > 0.0 && min_accuracy <= 1.0) {
            return Err(CertError::InvalidConfig(format!(
                "min_accuracy {} outside (0, 1]",
                min_accuracy
            )));
        }
        Ok(Self {
            meta: CheckMeta::new(NAME, CATEGORY, weight)?,
            min_accuracy,
        })
    }
}

impl ValidationCheck for AccuracyCheck {
    fn meta(&self) -> &CheckMeta {
        &self.meta
    }

    /// Score `100 · accuracy / min_accuracy`, capped at 100.
    fn run(&self, model: &dyn Model, data: &Dataset) -> std::result::Result<CheckOutcome, CheckError> {
        let predictions = stats::predict_checked(model, data.features())?;
        let accuracy = stats::accuracy(&predictions, data.labels());

        let passed = accuracy >= self.min_accuracy;
        let score = 100.0 * accuracy / self.min_accuracy;

        Ok(CheckOutcome::new(
            passed,
            score,
            details([
                ("accuracy", json!(accuracy)),
                ("threshold", json!(self.min_accuracy)),
                ("passed", json!(passed)),
            ]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Label;
    use crate::error::ModelError;

    /// Returns a fixed label vector regardless of input.
    struct Fixed(Vec<Label>);

    impl Model for Fixed {
        fn predict(&self, _: &[Vec<f64>]) -> std::result::Result<Vec<Label>, ModelError> {
            Ok(self.0.clone())
        }
    }

    fn data(labels: Vec<Label>) -> Dataset {
        Dataset::new(vec![vec![0.0]; labels.len()], labels).unwrap()
    }

    #[test]
    fn test_accuracy_at_threshold_passes() {
        // 17/20 = 0.85
        let labels = vec![1; 20];
        let mut preds = vec![1; 17];
        preds.extend([0, 0, 0]);
        let check = AccuracyCheck::new(0.85, 2.0).unwrap();
        let out = check.run(&Fixed(preds), &data(labels)).unwrap();
        assert!(out.passed);
        assert!((out.score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_low_accuracy_scores_proportionally() {
        // 6/10 = 0.60 → 100 · 0.60 / 0.85 ≈ 70.59
        let labels = vec![1; 10];
        let mut preds = vec![1; 6];
        preds.extend([0; 4]);
        let check = AccuracyCheck::new(0.85, 2.0).unwrap();
        let out = check.run(&Fixed(preds), &data(labels)).unwrap();
        assert!(!out.passed);
        assert!((out.score - 70.588).abs() < 0.01);
        assert_eq!(out.details["accuracy"], json!(0.6));
    }

    #[test]
    fn test_score_is_capped_at_100() {
        let check = AccuracyCheck::new(0.5, 2.0).unwrap();
        let out = check.run(&Fixed(vec![1, 1]), &data(vec![1, 1])).unwrap();
        assert_eq!(out.score, 100.0);
    }

    #[test]
    fn test_empty_dataset_scores_zero() {
        let check = AccuracyCheck::new(0.85, 2.0).unwrap();
        let out = check.run(&Fixed(vec![]), &data(vec![])).unwrap();
        assert!(!out.passed);
        assert_eq!(out.score, 0.0);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        assert!(AccuracyCheck::new(0.0, 2.0).is_err());
        assert!(AccuracyCheck::new(1.5, 2.0).is_err());
        assert!(AccuracyCheck::new(0.85, 0.0).is_err());
    }
}
