//! aicert core library
//!
//! Validates a trained classifier against a labeled dataset, aggregates the
//! check battery into a weighted score, and issues a tiered certification.
//! A separate red-team battery produces vulnerability findings and a risk
//! score.

pub mod certify;
pub mod check;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod obs;
pub mod redteam;
pub mod report;
pub mod runner;
pub mod stats;
pub mod summary;
pub mod telemetry;
pub mod validator;

pub use certify::{certificate_id, Certification, CertificationTier, ComplianceStandard};
pub use check::{
    standard_battery, AccuracyCheck, CheckMeta, CheckOutcome, DataQualityCheck, Details,
    FairnessCheck, InputHardeningCheck, RobustnessCheck, TransparencyCheck, ValidationCheck,
};
pub use config::{RedTeamConfig, ValidationConfig};
pub use dataset::{Dataset, Label};
pub use error::{CertError, CheckError, ModelError, Result};
pub use model::{Capability, LogisticModel, Model};
pub use redteam::{
    render_redteam_summary, Finding, Probe, RedTeamAssessment, RedTeamReport, RedTeamSummary,
    Severity, VulnerabilityCategory,
};
pub use report::{render_certificate, render_summary, AssessmentReport};
pub use runner::{CheckRecord, CheckRunner};
pub use summary::{summarize, CategoryStats, Summary};
pub use validator::Validator;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
