//! Validation checks.
//!
//! Each check implements one metric and turns it into a score in `[0, 100]`
//! plus a pass/fail verdict:
//!
//! - `accuracy`: prediction accuracy against a minimum
//! - `robustness`: accuracy lost under Gaussian input noise
//! - `fairness`: accuracy gap across a median split of a sensitive feature
//! - `transparency`: presence of explainability capabilities
//! - `data_quality`: NaN/Inf presence and class balance
//! - `input_hardening`: extreme-input handling and confidence calibration
//!
//! Checks never fail because a model lacks an optional capability; they
//! report a reduced score instead. Any `Err` or panic is turned into a
//! zero-score failure by the [`crate::runner::CheckRunner`].

pub mod accuracy;
pub mod data_quality;
pub mod fairness;
pub mod input_hardening;
pub mod robustness;
pub mod transparency;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ValidationConfig;
use crate::dataset::Dataset;
use crate::error::{CertError, CheckError, Result};
use crate::model::Model;

pub use accuracy::AccuracyCheck;
pub use data_quality::DataQualityCheck;
pub use fairness::FairnessCheck;
pub use input_hardening::InputHardeningCheck;
pub use robustness::RobustnessCheck;
pub use transparency::TransparencyCheck;

/// Free-form key → value details attached to a result.
pub type Details = BTreeMap<String, serde_json::Value>;

/// Build a [`Details`] map from literal pairs.
pub fn details<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> Details {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Clamp a raw score into `[0, 100]`. NaN becomes 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// `100 · (1 − value / limit)`, clamped. A non-positive limit only rewards a
/// non-positive value.
pub fn headroom_score(value: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return if value <= 0.0 { 100.0 } else { 0.0 };
    }
    clamp_score(100.0 * (1.0 - value / limit))
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    /// Always within `[0, 100]`.
    pub score: f64,
    pub details: Details,
}

impl CheckOutcome {
    /// Create an outcome; the score is clamped.
    pub fn new(passed: bool, score: f64, details: Details) -> Self {
        Self {
            passed,
            score: clamp_score(score),
            details,
        }
    }
}

/// Identity and aggregation weight of a check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckMeta {
    pub name: String,
    pub category: String,
    weight: f64,
}

impl CheckMeta {
    /// Create check metadata. The weight must be finite and strictly positive.
    pub fn new(name: impl Into<String>, category: impl Into<String>, weight: f64) -> Result<Self> {
        let name = name.into();
        if !weight.is_finite() || weight <= 0.0 {
            return Err(CertError::InvalidWeight { name, weight });
        }
        Ok(Self {
            name,
            category: category.into(),
            weight,
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// A single validation check.
pub trait ValidationCheck {
    fn meta(&self) -> &CheckMeta;

    /// Measure the model on `data`. Missing optional capabilities lower the score.
    fn run(
        &self,
        model: &dyn Model,
        data: &Dataset,
    ) -> std::result::Result<CheckOutcome, CheckError>;
}

/// The six built-in checks in their canonical order.
pub fn standard_battery(config: &ValidationConfig) -> Result<Vec<Box<dyn ValidationCheck>>> {
    let checks: Vec<Box<dyn ValidationCheck>> = vec![
        Box::new(AccuracyCheck::new(
            config.accuracy.min_accuracy,
            config.accuracy.weight,
        )?),
        Box::new(RobustnessCheck::new(
            config.robustness.max_degradation,
            config.robustness.noise_sigma,
            config.seed,
            config.robustness.weight,
        )?),
        Box::new(FairnessCheck::new(
            config.fairness.max_disparity,
            config.sensitive_feature,
            config.fairness.weight,
        )?),
        Box::new(TransparencyCheck::new(config.transparency.weight)?),
        Box::new(DataQualityCheck::new(config.data_quality.weight)?),
        Box::new(InputHardeningCheck::new(
            config.input_hardening.extreme_value,
            config.input_hardening.confidence_cutoff,
            config.input_hardening.max_overconfidence_rate,
            config.input_hardening.weight,
        )?),
    ];
    Ok(checks)
}
