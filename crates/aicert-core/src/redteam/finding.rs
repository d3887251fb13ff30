//! Severity taxonomy and finding records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Severity of a red-team finding, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Informational,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All levels, most severe first.
    pub const DESCENDING: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
    ];

    /// Contribution of one vulnerability to the risk score.
    pub fn weight(self) -> u32 {
        match self {
            Self::Critical => 25,
            Self::High => 15,
            Self::Medium => 8,
            Self::Low => 3,
            Self::Informational => 0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "Critical"),
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
            Self::Informational => write!(f, "Informational"),
        }
    }
}

/// Vulnerability class a probe targets.
///
/// Serialized as its label; unknown labels round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum VulnerabilityCategory {
    AdversarialRobustness,
    DataPoisoning,
    ModelExtraction,
    PrivacyLeakage,
    FairnessBias,
    PromptInjection,
    Backdoor,
    Other(String),
}

impl VulnerabilityCategory {
    const KNOWN: [VulnerabilityCategory; 7] = [
        Self::AdversarialRobustness,
        Self::DataPoisoning,
        Self::ModelExtraction,
        Self::PrivacyLeakage,
        Self::FairnessBias,
        Self::PromptInjection,
        Self::Backdoor,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::AdversarialRobustness => "Adversarial Robustness",
            Self::DataPoisoning => "Data Poisoning",
            Self::ModelExtraction => "Model Extraction",
            Self::PrivacyLeakage => "Privacy Leakage",
            Self::FairnessBias => "Fairness and Bias",
            Self::PromptInjection => "Prompt Injection",
            Self::Backdoor => "Backdoor Attack",
            Self::Other(label) => label,
        }
    }
}

impl std::fmt::Display for VulnerabilityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<VulnerabilityCategory> for String {
    fn from(category: VulnerabilityCategory) -> Self {
        match category {
            VulnerabilityCategory::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl From<String> for VulnerabilityCategory {
    fn from(label: String) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|c| c.label() == label)
            .unwrap_or(Self::Other(label))
    }
}

/// Numeric and boolean measurements attached to a finding.
pub type Metrics = BTreeMap<String, serde_json::Value>;

/// Outcome of one probe. Metrics are flattened into the JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: VulnerabilityCategory,
    pub test_name: String,
    pub severity: Severity,
    #[serde(flatten)]
    pub metrics: Metrics,
    pub description: String,
    pub recommendation: String,
}

impl Finding {
    /// Informational record for a probe that could not produce a measurement.
    pub fn not_measured(
        category: VulnerabilityCategory,
        test_name: &str,
        metrics: Metrics,
        description: String,
    ) -> Self {
        Self {
            category,
            test_name: test_name.to_string(),
            severity: Severity::Informational,
            metrics,
            description,
            recommendation: "Re-run once the model supports this probe".to_string(),
        }
    }
}
