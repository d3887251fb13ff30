//! Extreme-input handling and high-confidence error rate.

use std::panic::{self, AssertUnwindSafe};

use serde_json::json;

use super::{details, CheckMeta, CheckOutcome, ValidationCheck};
use crate::dataset::Dataset;
use crate::error::{CertError, CheckError, Result};
use crate::model::{Capability, Model};
use crate::stats;

pub const NAME: &str = "Input Hardening Validation";
pub const CATEGORY: &str = "Security";

const POINTS_PER_CONDITION: f64 = 50.0;
const PASS_SCORE: f64 = 50.0;

/// Two conditions worth 50 points each:
///
/// 1. A row filled with `extreme_value` is predicted without error or panic,
///    yields exactly one label, and (when probabilities are supported) only
///    finite probabilities.
/// 2. The share of rows misclassified with top-class probability above
///    `confidence_cutoff` is below `max_overconfidence_rate`. A model without
///    probability outputs does not meet this condition.
#[derive(Debug, Clone)]
pub struct InputHardeningCheck {
    meta: CheckMeta,
    extreme_value: f64,
    confidence_cutoff: f64,
    max_overconfidence_rate: f64,
}

impl InputHardeningCheck {
    /// Check feeding `extreme_value` rows and counting errors made above `confidence_cutoff`.
    pub fn new(
        extreme_value: f64,
        confidence_cutoff: f64,
        max_overconfidence_rate: f64,
        weight: f64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence_cutoff) {
            return Err(CertError::InvalidConfig(format!(
                "confidence_cutoff {} outside [0, 1]",
                confidence_cutoff
            )));
        }
        if !(0.0..=1.0).contains(&max_overconfidence_rate) {
            return Err(CertError::InvalidConfig(format!(
                "max_overconfidence_rate {} outside [0, 1]",
                max_overconfidence_rate
            )));
        }
        Ok(Self {
            meta: CheckMeta::new(NAME, CATEGORY, weight)?,
            extreme_value,
            confidence_cutoff,
            max_overconfidence_rate,
        })
    }

    fn handles_extreme_input(&self, model: &dyn Model, width: usize) -> bool {
        let rows = vec![vec![self.extreme_value; width.max(1)]];
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            let labels = stats::predict_checked(model, &rows)?;
            if model.supports(Capability::Probabilities) {
                let probabilities = stats::probabilities_checked(model, &rows)?;
                if probabilities.iter().flatten().any(|p| !p.is_finite()) {
                    return Ok(false);
                }
            }
            Ok::<bool, CheckError>(labels.len() == 1)
        }));
        matches!(attempt, Ok(Ok(true)))
    }
}

impl ValidationCheck for InputHardeningCheck {
    fn meta(&self) -> &CheckMeta {
        &self.meta
    }

    /// Award 50 points each for surviving extreme input and for calibrated confidence.
    fn run(&self, model: &dyn Model, data: &Dataset) -> std::result::Result<CheckOutcome, CheckError> {
        let handles_extreme = self.handles_extreme_input(model, data.width());

        let overconfidence = if model.supports(Capability::Probabilities) {
            Some(stats::overconfidence(model, data, self.confidence_cutoff)?)
        } else {
            None
        };
        let calibrated = overconfidence
            .map(|o| o.rate < self.max_overconfidence_rate)
            .unwrap_or(false);

        let score = [handles_extreme, calibrated]
            .iter()
            .filter(|met| **met)
            .count() as f64
            * POINTS_PER_CONDITION;
        let passed = score >= PASS_SCORE;

        Ok(CheckOutcome::new(
            passed,
            score,
            details([
                ("handles_extreme_values", json!(handles_extreme)),
                ("well_calibrated", json!(calibrated)),
                (
                    "high_confidence_error_rate",
                    json!(overconfidence.map(|o| o.rate)),
                ),
                ("confidence_cutoff", json!(self.confidence_cutoff)),
                ("hardening_score", json!(score)),
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
    use crate::model::LogisticModel;

    fn data() -> Dataset {
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 - 10.0]).collect();
        let labels = features.iter().map(|r| i64::from(r[0] >= 0.0)).collect();
        Dataset::new(features, labels).unwrap()
    }

    fn check() -> InputHardeningCheck {
        InputHardeningCheck::new(1e10, 0.95, 0.05, 3.0).unwrap()
    }

    /// Panics on any input above 1e6.
    struct Fragile;

    impl Model for Fragile {
        fn predict(&self, f: &[Vec<f64>]) -> std::result::Result<Vec<Label>, ModelError> {
            if f.iter().flatten().any(|v| *v > 1e6) {
                panic!("overflow in feature scaling");
            }
            Ok(f.iter().map(|r| i64::from(r[0] >= 0.0)).collect())
        }
    }

    /// Predictions are right but probabilities overflow to NaN on large input.
    struct NanProbabilities;

    impl Model for NanProbabilities {
        fn predict(&self, f: &[Vec<f64>]) -> std::result::Result<Vec<Label>, ModelError> {
            Ok(f.iter().map(|r| i64::from(r[0] >= 0.0)).collect())
        }

        fn supports(&self, capability: Capability) -> bool {
            capability == Capability::Probabilities
        }

        fn predict_probabilities(
            &self,
            f: &[Vec<f64>],
        ) -> std::result::Result<Vec<Vec<f64>>, ModelError> {
            Ok(f
                .iter()
                .map(|r| {
                    if r[0].abs() > 1e6 {
                        vec![f64::NAN, f64::NAN]
                    } else {
                        vec![0.5, 0.5]
                    }
                })
                .collect())
        }
    }

    #[test]
    fn test_well_behaved_model_scores_full() {
        let out = check()
            .run(&LogisticModel::new(vec![1.0], 0.0), &data())
            .unwrap();
        assert!(out.passed);
        assert_eq!(out.score, 100.0);
    }

    #[test]
    fn test_panicking_model_loses_extreme_input_points() {
        let out = check().run(&Fragile, &data()).unwrap();
        assert_eq!(out.details["handles_extreme_values"], json!(false));
        // No probabilities either, so nothing is earned.
        assert_eq!(out.score, 0.0);
        assert!(!out.passed);
    }

    #[test]
    fn test_non_finite_probabilities_fail_extreme_condition() {
        let out = check().run(&NanProbabilities, &data()).unwrap();
        assert_eq!(out.details["handles_extreme_values"], json!(false));
        assert_eq!(out.details["well_calibrated"], json!(true));
        assert_eq!(out.score, 50.0);
        assert!(out.passed);
    }

    #[test]
    fn test_overconfident_errors_fail_calibration() {
        // Inverted model: every prediction wrong with high confidence.
        let model = LogisticModel::new(vec![-100.0], 0.0);
        let out = check().run(&model, &data()).unwrap();
        assert_eq!(out.details["well_calibrated"], json!(false));
        assert_eq!(out.details["handles_extreme_values"], json!(true));
        assert_eq!(out.score, 50.0);
    }
}
