//! Certification tiers and certificate issuance.
//!
//! The tier table is evaluated top-down and the first matching row wins:
//!
//! | Tier     | weighted score | pass rate |
//! |----------|----------------|-----------|
//! | Platinum | ≥ 95           | = 1.0     |
//! | Gold     | ≥ 85           | ≥ 0.85    |
//! | Silver   | ≥ 75           | ≥ 0.70    |
//! | Bronze   | ≥ 65           | ≥ 0.50    |
//! | Failed   | otherwise      |           |

use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CertError;
use crate::summary::Summary;

/// Days a certificate stays valid after issuance.
pub const VALIDITY_DAYS: i64 = 365;

/// Discrete certification outcome, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CertificationTier {
    Failed,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl CertificationTier {
    /// Map a weighted score and pass rate onto a tier.
    pub fn classify(score: f64, pass_rate: f64) -> Self {
        if score >= 95.0 && pass_rate >= 1.0 {
            Self::Platinum
        } else if score >= 85.0 && pass_rate >= 0.85 {
            Self::Gold
        } else if score >= 75.0 && pass_rate >= 0.70 {
            Self::Silver
        } else if score >= 65.0 && pass_rate >= 0.50 {
            Self::Bronze
        } else {
            Self::Failed
        }
    }

    pub fn is_certified(self) -> bool {
        self != Self::Failed
    }
}

impl std::fmt::Display for CertificationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed => write!(f, "Failed"),
            Self::Bronze => write!(f, "Bronze"),
            Self::Silver => write!(f, "Silver"),
            Self::Gold => write!(f, "Gold"),
            Self::Platinum => write!(f, "Platinum"),
        }
    }
}

/// Compliance framework a report is issued against. Carried as metadata only.
///
/// Serialized as its human-readable label; labels that match no built-in
/// framework round-trip as [`ComplianceStandard::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ComplianceStandard {
    NistAiRmf,
    EuAiAct,
    IsoIec42001,
    OwaspMlTop10,
    Custom(String),
}

impl ComplianceStandard {
    pub fn label(&self) -> &str {
        match self {
            Self::NistAiRmf => "NIST AI Risk Management Framework",
            Self::EuAiAct => "EU AI Act",
            Self::IsoIec42001 => "ISO/IEC 42001",
            Self::OwaspMlTop10 => "OWASP Machine Learning Top 10",
            Self::Custom(label) => label,
        }
    }

    fn builtin() -> [Self; 4] {
        [Self::NistAiRmf, Self::EuAiAct, Self::IsoIec42001, Self::OwaspMlTop10]
    }

    fn key(&self) -> Option<&'static str> {
        match self {
            Self::NistAiRmf => Some("nist-ai-rmf"),
            Self::EuAiAct => Some("eu-ai-act"),
            Self::IsoIec42001 => Some("iso-iec-42001"),
            Self::OwaspMlTop10 => Some("owasp-ml-top-10"),
            Self::Custom(_) => None,
        }
    }
}

impl std::fmt::Display for ComplianceStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses a short key (`nist-ai-rmf`, `NIST_AI_RMF`, ...) into a built-in
/// standard. Use [`ComplianceStandard::Custom`] for anything else.
impl FromStr for ComplianceStandard {
    type Err = CertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::builtin()
            .into_iter()
            .find(|s| s.key() == Some(normalized.as_str()))
            .ok_or_else(|| CertError::UnknownStandard(s.to_string()))
    }
}

impl From<ComplianceStandard> for String {
    fn from(standard: ComplianceStandard) -> Self {
        match standard {
            ComplianceStandard::Custom(label) => label,
            other => other.label().to_string(),
        }
    }
}

impl From<String> for ComplianceStandard {
    fn from(label: String) -> Self {
        Self::builtin()
            .into_iter()
            .find(|s| s.label() == label)
            .or_else(|| label.parse().ok())
            .unwrap_or(Self::Custom(label))
    }
}

/// Issued certification block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub tier: CertificationTier,
    pub certificate_id: String,
    pub score: f64,
    pub pass_rate: f64,
    pub issued_date: DateTime<Utc>,
    /// Stamped only; expiry is not enforced.
    pub valid_until: DateTime<Utc>,
    pub compliance_standard: ComplianceStandard,
}

impl Certification {
    /// Classify a summary and stamp the certificate.
    pub fn issue(
        subject_name: &str,
        summary: &Summary,
        standard: ComplianceStandard,
        issued: DateTime<Utc>,
    ) -> Self {
        let score = summary.weighted_score;
        let pass_rate = summary.pass_rate;
        Self {
            tier: CertificationTier::classify(score, pass_rate),
            certificate_id: certificate_id(subject_name, issued, score),
            score,
            pass_rate,
            issued_date: issued,
            valid_until: issued + Duration::days(VALIDITY_DAYS),
            compliance_standard: standard,
        }
    }
}

/// First 16 hex chars, uppercased, of SHA-256 over subject, issue time and score.
///
/// The score keeps its decimal point (`100.0`, not `100`).
pub fn certificate_id(subject_name: &str, issued: DateTime<Utc>, score: f64) -> String {
    let material = format!(
        "{}{}{:?}",
        subject_name,
        issued.to_rfc3339_opts(SecondsFormat::Micros, true),
        score
    );
    let digest = Sha256::digest(material.as_bytes());
    hex::encode(digest)[..16].to_ascii_uppercase()
}
