//! Accuracy degradation under Gaussian input noise.

use serde_json::json;

use super::{details, headroom_score, CheckMeta, CheckOutcome, ValidationCheck};
use crate::dataset::Dataset;
use crate::error::{CertError, CheckError, Result};
use crate::model::Model;
use crate::stats;

pub const NAME: &str = "Robustness Validation";
pub const CATEGORY: &str = "Security";

/// Passes when the accuracy drop `d <= max_degradation`.
///
/// The perturbation seed is taken from the configuration when present and
/// drawn from OS entropy otherwise; either way it is recorded in the details
/// so the run can be replayed.
#[derive(Debug, Clone)]
pub struct RobustnessCheck {
    meta: CheckMeta,
    max_degradation: f64,
    noise_sigma: f64,
    seed: Option<u64>,
}

impl RobustnessCheck {
    /// Check that adds `N(0, noise_sigma²)` noise; a missing seed is drawn at run time.
    pub fn new(
        max_degradation: f64,
        noise_sigma: f64,
        seed: Option<u64>,
        weight: f64,
    ) -> Result<Self> {
        if !(max_degradation.is_finite() && max_degradation > 0.0) {
            return Err(CertError::InvalidConfig(format!(
                "max_degradation {} must be > 0",
                max_degradation
            )));
        }
        if !(noise_sigma.is_finite() && noise_sigma >= 0.0) {
            return Err(CertError::InvalidConfig(format!(
                "noise_sigma {} must be >= 0",
                noise_sigma
            )));
        }
        Ok(Self {
            meta: CheckMeta::new(NAME, CATEGORY, weight)?,
            max_degradation,
            noise_sigma,
            seed,
        })
    }
}

impl ValidationCheck for RobustnessCheck {
    fn meta(&self) -> &CheckMeta {
        &self.meta
    }

    /// Compare clean and perturbed accuracy; the seed used is recorded.
    fn run(&self, model: &dyn Model, data: &Dataset) -> std::result::Result<CheckOutcome, CheckError> {
        let seed = stats::resolve_seed(self.seed);
        let mut rng = stats::seeded_rng(seed);
        let measured = stats::degradation(model, data, self.noise_sigma, &mut rng)?;

        let passed = measured.degradation <= self.max_degradation;
        let score = headroom_score(measured.degradation, self.max_degradation);

        Ok(CheckOutcome::new(
            passed,
            score,
            details([
                ("original_accuracy", json!(measured.original_accuracy)),
                ("perturbed_accuracy", json!(measured.perturbed_accuracy)),
                ("degradation", json!(measured.degradation)),
                ("threshold", json!(self.max_degradation)),
                ("noise_sigma", json!(self.noise_sigma)),
                ("seed", json!(seed)),
                ("passed", json!(passed)),
            ]),
        ))
    }
}
