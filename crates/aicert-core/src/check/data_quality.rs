//! Feature hygiene and class balance.

use serde_json::json;

use super::{details, CheckMeta, CheckOutcome, ValidationCheck};
use crate::dataset::Dataset;
use crate::error::{CheckError, Result};
use crate::model::Model;
use crate::stats;

pub const NAME: &str = "Data Quality Validation";
pub const CATEGORY: &str = "Data Integrity";

const NAN_PENALTY: f64 = 30.0;
const INF_PENALTY: f64 = 30.0;
const IMBALANCE_PENALTY: f64 = 20.0;
/// Balance ratios strictly below this are penalized.
const MIN_BALANCE_RATIO: f64 = 0.5;
const PASS_SCORE: f64 = 70.0;

/// Inspects the dataset only; the model is not queried.
#[derive(Debug, Clone)]
pub struct DataQualityCheck {
    meta: CheckMeta,
}

impl DataQualityCheck {
    /// Data quality check with the given aggregation weight.
    pub fn new(weight: f64) -> Result<Self> {
        Ok(Self {
            meta: CheckMeta::new(NAME, CATEGORY, weight)?,
        })
    }
}

impl ValidationCheck for DataQualityCheck {
    fn meta(&self) -> &CheckMeta {
        &self.meta
    }

    /// Deduct for NaN cells, infinite cells and a balance ratio below 0.5.
    fn run(&self, _model: &dyn Model, data: &Dataset) -> std::result::Result<CheckOutcome, CheckError> {
        let has_nan = data.has_nan();
        let has_inf = data.has_infinite();
        let balance = stats::class_balance_ratio(data);

        let mut score = 100.0;
        if has_nan {
            score -= NAN_PENALTY;
        }
        if has_inf {
            score -= INF_PENALTY;
        }
        if balance < MIN_BALANCE_RATIO {
            score -= IMBALANCE_PENALTY;
        }
        let passed = score >= PASS_SCORE;

        Ok(CheckOutcome::new(
            passed,
            score,
            details([
                ("has_nan_values", json!(has_nan)),
                ("has_inf_values", json!(has_inf)),
                ("class_balance_ratio", json!(balance)),
                ("quality_score", json!(score)),
                ("passed", json!(passed)),
            ]),
        ))
    }
}
