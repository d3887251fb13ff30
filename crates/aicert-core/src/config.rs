//! Run configuration for the validation and red-team batteries.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//! Values are checked by `validate()` before any check is constructed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::certify::ComplianceStandard;
use crate::error::{CertError, Result};

/// Accuracy threshold and weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccuracyConfig {
    pub min_accuracy: f64,
    pub weight: f64,
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            min_accuracy: 0.85,
            weight: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RobustnessConfig {
    pub max_degradation: f64,
    /// Standard deviation of the Gaussian noise added to every feature.
    pub noise_sigma: f64,
    pub weight: f64,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            max_degradation: 0.15,
            noise_sigma: 0.1,
            weight: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FairnessConfig {
    pub max_disparity: f64,
    pub weight: f64,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            max_disparity: 0.10,
            weight: 2.5,
        }
    }
}

/// Weight-only section for checks without tunable thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightConfig {
    pub weight: f64,
}

fn transparency_weight() -> WeightConfig {
    WeightConfig { weight: 1.5 }
}

fn data_quality_weight() -> WeightConfig {
    WeightConfig { weight: 2.0 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputHardeningConfig {
    /// Value filling the out-of-range probe row.
    pub extreme_value: f64,
    pub confidence_cutoff: f64,
    pub max_overconfidence_rate: f64,
    pub weight: f64,
}

impl Default for InputHardeningConfig {
    fn default() -> Self {
        Self {
            extreme_value: 1e10,
            confidence_cutoff: 0.95,
            max_overconfidence_rate: 0.05,
            weight: 3.0,
        }
    }
}

/// Configuration of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub subject_name: String,
    pub compliance_standard: ComplianceStandard,
    /// Perturbation seed. When unset, each run draws and records its own.
    pub seed: Option<u64>,
    /// Wall-clock budget per check; exceeding it fails the check.
    pub check_timeout_ms: Option<u64>,
    /// Feature column split at its median by the fairness check.
    pub sensitive_feature: usize,
    pub accuracy: AccuracyConfig,
    pub robustness: RobustnessConfig,
    pub fairness: FairnessConfig,
    #[serde(default = "transparency_weight")]
    pub transparency: WeightConfig,
    #[serde(default = "data_quality_weight")]
    pub data_quality: WeightConfig,
    pub input_hardening: InputHardeningConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            subject_name: "AI Model".to_string(),
            compliance_standard: ComplianceStandard::NistAiRmf,
            seed: None,
            check_timeout_ms: None,
            sensitive_feature: 0,
            accuracy: AccuracyConfig::default(),
            robustness: RobustnessConfig::default(),
            fairness: FairnessConfig::default(),
            transparency: transparency_weight(),
            data_quality: data_quality_weight(),
            input_hardening: InputHardeningConfig::default(),
        }
    }
}

impl ValidationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.subject_name.trim().is_empty() {
            return Err(invalid("subject_name must not be empty"));
        }
        unit_interval("accuracy.min_accuracy", self.accuracy.min_accuracy, false)?;
        positive("robustness.max_degradation", self.robustness.max_degradation)?;
        non_negative("robustness.noise_sigma", self.robustness.noise_sigma)?;
        positive("fairness.max_disparity", self.fairness.max_disparity)?;
        if !self.input_hardening.extreme_value.is_finite() {
            return Err(invalid("input_hardening.extreme_value must be finite"));
        }
        unit_interval(
            "input_hardening.confidence_cutoff",
            self.input_hardening.confidence_cutoff,
            true,
        )?;
        unit_interval(
            "input_hardening.max_overconfidence_rate",
            self.input_hardening.max_overconfidence_rate,
            true,
        )?;
        if self.check_timeout_ms == Some(0) {
            return Err(invalid("check_timeout_ms must be > 0"));
        }
        for (name, weight) in [
            ("accuracy.weight", self.accuracy.weight),
            ("robustness.weight", self.robustness.weight),
            ("fairness.weight", self.fairness.weight),
            ("transparency.weight", self.transparency.weight),
            ("data_quality.weight", self.data_quality.weight),
            ("input_hardening.weight", self.input_hardening.weight),
        ] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(CertError::InvalidWeight {
                    name: name.to_string(),
                    weight,
                });
            }
        }
        Ok(())
    }
}

/// Configuration of one red-team assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedTeamConfig {
    pub model_name: String,
    /// Noise scale of the adversarial flip probe.
    pub epsilon: f64,
    pub sensitive_feature: usize,
    pub seed: Option<u64>,
}

impl Default for RedTeamConfig {
    fn default() -> Self {
        Self {
            model_name: "AI Model".to_string(),
            epsilon: 0.1,
            sensitive_feature: 0,
            seed: None,
        }
    }
}

impl RedTeamConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(invalid("model_name must not be empty"));
        }
        non_negative("epsilon", self.epsilon)
    }
}

fn invalid(msg: impl Into<String>) -> CertError {
    CertError::InvalidConfig(msg.into())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be > 0, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be >= 0, got {}", name, value)))
    }
}

/// `(0, 1]`, or `[0, 1]` when `allow_zero`.
fn unit_interval(name: &str, value: f64, allow_zero: bool) -> Result<()> {
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if lower_ok && value <= 1.0 {
        Ok(())
    } else {
        let range = if allow_zero { "[0, 1]" } else { "(0, 1]" };
        Err(invalid(format!("{} must be within {}, got {}", name, range, value)))
    }
}
