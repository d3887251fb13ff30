//! Explainability capabilities.

use serde_json::json;

use super::{details, CheckMeta, CheckOutcome, ValidationCheck};
use crate::dataset::Dataset;
use crate::error::{CheckError, Result};
use crate::model::{Capability, Model};

pub const NAME: &str = "Transparency Validation";
pub const CATEGORY: &str = "Governance";

const POINTS_PER_CAPABILITY: f64 = 50.0;
const PASS_SCORE: f64 = 50.0;

/// Awards 50 points each for feature importances and probability outputs.
#[derive(Debug, Clone)]
pub struct TransparencyCheck {
    meta: CheckMeta,
}

impl TransparencyCheck {
    /// Transparency check with the given aggregation weight.
    pub fn new(weight: f64) -> Result<Self> {
        Ok(Self {
            meta: CheckMeta::new(NAME, CATEGORY, weight)?,
        })
    }
}

impl ValidationCheck for TransparencyCheck {
    fn meta(&self) -> &CheckMeta {
        &self.meta
    }

    /// Award 50 points per explainability capability the model exposes.
    fn run(&self, model: &dyn Model, _data: &Dataset) -> std::result::Result<CheckOutcome, CheckError> {
        let has_importances = model.supports(Capability::FeatureImportances);
        let has_probabilities = model.supports(Capability::Probabilities);

        let score = [has_importances, has_probabilities]
            .iter()
            .filter(|present| **present)
            .count() as f64
            * POINTS_PER_CAPABILITY;
        let passed = score >= PASS_SCORE;

        Ok(CheckOutcome::new(
            passed,
            score,
            details([
                ("has_feature_importance", json!(has_importances)),
                ("has_probability_output", json!(has_probabilities)),
                ("transparency_score", json!(score)),
                ("passed", json!(passed)),
            ]),
        ))
    }
}
