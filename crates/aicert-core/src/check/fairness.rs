//! Accuracy disparity across a median split of a sensitive feature.

use serde_json::json;

use super::{details, headroom_score, CheckMeta, CheckOutcome, ValidationCheck};
use crate::dataset::Dataset;
use crate::error::{CertError, CheckError, Result};
use crate::model::Model;
use crate::stats;

pub const NAME: &str = "Fairness Validation";
pub const CATEGORY: &str = "Ethics";

/// Passes when disparity `δ <= max_disparity` (inclusive).
#[derive(Debug, Clone)]
pub struct FairnessCheck {
    meta: CheckMeta,
    max_disparity: f64,
    sensitive_feature: usize,
}

impl FairnessCheck {
    /// Check that passes while the group accuracy gap stays within `max_disparity`.
    pub fn new(max_disparity: f64, sensitive_feature: usize, weight: f64) -> Result<Self> {
        if !(max_disparity.is_finite() && max_disparity > 0.0) {
            return Err(CertError::InvalidConfig(format!(
                "max_disparity {} must be > 0",
                max_disparity
            )));
        }
        Ok(Self {
            meta: CheckMeta::new(NAME, CATEGORY, weight)?,
            max_disparity,
            sensitive_feature,
        })
    }
}

impl ValidationCheck for FairnessCheck {
    fn meta(&self) -> &CheckMeta {
        &self.meta
    }

    /// Split on the median of the sensitive feature and compare group accuracy.
    fn run(&self, model: &dyn Model, data: &Dataset) -> std::result::Result<CheckOutcome, CheckError> {
        let split = stats::group_disparity(model, data, self.sensitive_feature)?;

        let passed = split.disparity <= self.max_disparity;
        let score = headroom_score(split.disparity, self.max_disparity);

        Ok(CheckOutcome::new(
            passed,
            score,
            details([
                ("sensitive_feature", json!(self.sensitive_feature)),
                ("split_median", json!(split.median)),
                ("group_a_size", json!(split.group_a_size)),
                ("group_b_size", json!(split.group_b_size)),
                ("group_a_accuracy", json!(split.group_a_accuracy)),
                ("group_b_accuracy", json!(split.group_b_accuracy)),
                ("disparity", json!(split.disparity)),
                ("threshold", json!(self.max_disparity)),
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

    /// Predicts the label stored in feature 1.
    struct Echo;

    impl Model for Echo {
        fn predict(&self, features: &[Vec<f64>]) -> std::result::Result<Vec<Label>, ModelError> {
            Ok(features.iter().map(|r| r[1] as Label).collect())
        }
    }

    /// Ten rows per group; `wrong_a` / `wrong_b` rows per group are mispredicted.
    fn split_data(wrong_a: usize, wrong_b: usize) -> Dataset {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            features.push(vec![0.0, 1.0]);
            labels.push(if i < wrong_a { 0 } else { 1 });
        }
        for i in 0..10 {
            features.push(vec![10.0, 1.0]);
            labels.push(if i < wrong_b { 0 } else { 1 });
        }
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn test_equal_groups_score_full() {
        let check = FairnessCheck::new(0.10, 0, 2.5).unwrap();
        let out = check.run(&Echo, &split_data(1, 1)).unwrap();
        assert!(out.passed);
        assert_eq!(out.score, 100.0);
        assert_eq!(out.details["disparity"], json!(0.0));
    }

    #[test]
    fn test_disparity_within_limit_scores_headroom() {
        // group A 1.0, group B 0.8 → δ ≈ 0.2 against a 0.25 limit
        let check = FairnessCheck::new(0.25, 0, 2.5).unwrap();
        let out = check.run(&Echo, &split_data(0, 2)).unwrap();
        assert!(out.passed);
        assert!((out.score - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_exact_boundary_is_inclusive() {
        // group A accuracy 1.0, group B accuracy 0.5 → δ = 0.5 exactly.
        let check = FairnessCheck::new(0.5, 0, 2.5).unwrap();
        let out = check.run(&Echo, &split_data(0, 5)).unwrap();
        assert!(out.passed);
        assert_eq!(out.score, 0.0);
    }

    #[test]
    fn test_large_disparity_fails() {
        let check = FairnessCheck::new(0.10, 0, 2.5).unwrap();
        let out = check.run(&Echo, &split_data(0, 5)).unwrap();
        assert!(!out.passed);
        assert_eq!(out.score, 0.0);
    }

    #[test]
    fn test_out_of_range_feature_is_an_error() {
        let check = FairnessCheck::new(0.10, 7, 2.5).unwrap();
        assert!(check.run(&Echo, &split_data(0, 0)).is_err());
    }
}
