//! Red-team battery: probes, findings, and the additive risk score.
//!
//! Every probe contributes one finding to `all_tests`. A finding is also a
//! vulnerability when its severity is above `Informational` and at or above
//! the probe's inclusion threshold. The risk score is kept apart from the
//! certification score and is never fed into the tier table.

pub mod finding;
pub mod probes;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::check::details;
use crate::config::RedTeamConfig;
use crate::dataset::Dataset;
use crate::error::{CheckError, Result};
use crate::metrics::METRICS;
use crate::model::Model;
use crate::obs::{self, AssessmentSpan};
use crate::runner::panic_message;

pub use finding::{Finding, Metrics, Severity, VulnerabilityCategory};
pub use probes::{
    AdversarialRobustnessProbe, ConfidenceCalibrationProbe, FeatureImportanceProbe,
    InputValidationProbe, ModelBiasProbe,
};

/// Maximum risk score.
pub const MAX_RISK_SCORE: u32 = 100;

/// A single red-team probe.
pub trait Probe {
    /// Test name recorded in the finding.
    fn name(&self) -> &str;

    fn category(&self) -> VulnerabilityCategory;

    /// Lowest severity at which a finding counts as a vulnerability.
    fn inclusion_threshold(&self) -> Severity;

    /// Measure the model. Missing capabilities yield a skipped finding, not an error.
    fn run(&self, model: &dyn Model, data: &Dataset) -> std::result::Result<Finding, CheckError>;
}

/// The five built-in probes in their canonical order.
pub fn standard_probes(config: &RedTeamConfig) -> Vec<Box<dyn Probe>> {
    let probes: Vec<Box<dyn Probe>> = vec![
        Box::new(AdversarialRobustnessProbe {
            epsilon: config.epsilon,
            seed: config.seed,
        }),
        Box::new(ConfidenceCalibrationProbe::default()),
        Box::new(FeatureImportanceProbe),
        Box::new(InputValidationProbe),
        Box::new(ModelBiasProbe {
            sensitive_feature: config.sensitive_feature,
        }),
    ];
    probes
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedTeamSummary {
    pub total_tests: usize,
    pub vulnerabilities_found: usize,
    /// Vulnerability count per severity; every level is present.
    pub severity_breakdown: BTreeMap<Severity, usize>,
    /// `min(100, Σ severity weight)` over vulnerabilities.
    pub risk_score: u32,
}

impl RedTeamSummary {
    pub fn from_findings(all_tests: &[Finding], vulnerabilities: &[Finding]) -> Self {
        let mut severity_breakdown: BTreeMap<Severity, usize> =
            Severity::DESCENDING.iter().map(|s| (*s, 0)).collect();
        for v in vulnerabilities {
            *severity_breakdown.entry(v.severity).or_insert(0) += 1;
        }
        Self {
            total_tests: all_tests.len(),
            vulnerabilities_found: vulnerabilities.len(),
            severity_breakdown,
            risk_score: risk_score(vulnerabilities),
        }
    }
}

pub fn risk_score(vulnerabilities: &[Finding]) -> u32 {
    vulnerabilities
        .iter()
        .map(|v| v.severity.weight())
        .sum::<u32>()
        .min(MAX_RISK_SCORE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedTeamReport {
    pub model_name: String,
    pub test_date: DateTime<Utc>,
    pub vulnerabilities: Vec<Finding>,
    pub all_tests: Vec<Finding>,
    pub summary: RedTeamSummary,
}

impl RedTeamReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs probes in order and collects their findings.
pub struct RedTeamAssessment {
    model_name: String,
    probes: Vec<Box<dyn Probe>>,
}

impl RedTeamAssessment {
    /// Validate `config` and load the standard probes.
    pub fn from_config(config: &RedTeamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_probes(
            config.model_name.clone(),
            standard_probes(config),
        ))
    }

    /// Assessment over a caller-assembled probe list.
    pub fn with_probes(model_name: impl Into<String>, probes: Vec<Box<dyn Probe>>) -> Self {
        Self {
            model_name: model_name.into(),
            probes,
        }
    }

    /// Run every probe, stamped with the current time.
    pub fn run(&self, model: &dyn Model, data: &Dataset) -> RedTeamReport {
        self.run_at(model, data, Utc::now())
    }

    /// Run every probe with an explicit report date.
    pub fn run_at(&self, model: &dyn Model, data: &Dataset, test_date: DateTime<Utc>) -> RedTeamReport {
        let span = AssessmentSpan::start("red_team");
        obs::emit_assessment_started(span.run_id(), &self.model_name, self.probes.len(), data.len());

        let mut all_tests = Vec::with_capacity(self.probes.len());
        let mut vulnerabilities = Vec::new();

        for probe in &self.probes {
            let finding = run_probe(probe.as_ref(), model, data);
            METRICS.inc_probes_executed();

            let vulnerable = is_vulnerability(&finding, probe.inclusion_threshold());
            obs::emit_probe_finished(probe.name(), &finding.severity, vulnerable);
            if vulnerable {
                METRICS.inc_vulnerabilities();
                obs::emit_vulnerability_recorded(
                    &finding.test_name,
                    finding.category.label(),
                    &finding.severity,
                );
                vulnerabilities.push(finding.clone());
            }
            all_tests.push(finding);
        }

        let summary = RedTeamSummary::from_findings(&all_tests, &vulnerabilities);
        obs::emit_redteam_finished(
            span.run_id(),
            summary.total_tests,
            summary.vulnerabilities_found,
            f64::from(summary.risk_score),
        );
        METRICS.flush();

        RedTeamReport {
            model_name: self.model_name.clone(),
            test_date,
            vulnerabilities,
            all_tests,
            summary,
        }
    }
}

pub fn is_vulnerability(finding: &Finding, threshold: Severity) -> bool {
    finding.severity > Severity::Informational && finding.severity >= threshold
}

/// Run one probe; errors and panics become informational findings.
fn run_probe(probe: &dyn Probe, model: &dyn Model, data: &Dataset) -> Finding {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| probe.run(model, data)));
    let error = match attempt {
        Ok(Ok(finding)) => return finding,
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("probe panicked: {}", panic_message(payload.as_ref())),
    };
    obs::emit_check_failed(probe.name(), &error);
    Finding::not_measured(
        probe.category(),
        probe.name(),
        details([("error", json!(error))]),
        format!("Probe could not be completed: {}", error),
    )
}

/// Console summary: totals, risk score and non-zero severity counts.
pub fn render_redteam_summary(report: &RedTeamReport) -> String {
    let rule = "=".repeat(60);
    let s = &report.summary;
    let mut out = String::new();
    out.push_str(&format!("{}\nASSESSMENT SUMMARY\n{}\n", rule, rule));
    out.push_str(&format!("Target: {}\n", report.model_name));
    out.push_str(&format!("Total Tests Run: {}\n", s.total_tests));
    out.push_str(&format!("Vulnerabilities Found: {}\n", s.vulnerabilities_found));
    out.push_str(&format!("Risk Score: {}/100\n", s.risk_score));

    out.push_str("\nSeverity Breakdown:\n");
    for severity in Severity::DESCENDING {
        let count = s.severity_breakdown.get(&severity).copied().unwrap_or(0);
        if count > 0 {
            out.push_str(&format!("  {}: {}\n", severity, count));
        }
    }

    if !report.vulnerabilities.is_empty() {
        out.push_str("\nVulnerabilities:\n");
        for v in &report.vulnerabilities {
            out.push_str(&format!(
                "  [{}] {} ({}): {}\n",
                v.severity, v.test_name, v.category, v.description
            ));
        }
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogisticModel;
    use tracing_test::traced_test;

    fn finding(severity: Severity) -> Finding {
        Finding {
            category: VulnerabilityCategory::AdversarialRobustness,
            test_name: "t".to_string(),
            severity,
            metrics: Metrics::new(),
            description: "d".to_string(),
            recommendation: "r".to_string(),
        }
    }

    #[test]
    fn test_inclusion_threshold() {
        assert!(is_vulnerability(&finding(Severity::Medium), Severity::Medium));
        assert!(!is_vulnerability(&finding(Severity::Low), Severity::Medium));
        assert!(is_vulnerability(&finding(Severity::Low), Severity::Low));
        assert!(!is_vulnerability(
            &finding(Severity::Informational),
            Severity::Informational
        ));
    }

    #[test]
    fn test_risk_score_is_capped() {
        let five_critical: Vec<Finding> = (0..5).map(|_| finding(Severity::Critical)).collect();
        assert_eq!(risk_score(&five_critical), 100);
        let mixed = vec![finding(Severity::High), finding(Severity::Medium)];
        assert_eq!(risk_score(&mixed), 23);
        assert_eq!(risk_score(&[]), 0);
    }

    #[test]
    fn test_summary_has_every_severity_key() {
        let summary = RedTeamSummary::from_findings(&[], &[]);
        assert_eq!(summary.severity_breakdown.len(), 5);
        assert!(summary.severity_breakdown.values().all(|c| *c == 0));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["severity_breakdown"]["Informational"], json!(0));
    }

    #[test]
    fn test_render_lists_only_non_zero_severities() {
        let vulns = vec![finding(Severity::High)];
        let report = RedTeamReport {
            model_name: "Detector".to_string(),
            test_date: Utc::now(),
            summary: RedTeamSummary::from_findings(&vulns, &vulns),
            all_tests: vulns.clone(),
            vulnerabilities: vulns,
        };
        let text = render_redteam_summary(&report);
        assert!(text.contains("Risk Score: 15/100"));
        assert!(text.contains("  High: 1\n"));
        assert!(!text.contains("  Low:"));
    }

    #[traced_test]
    #[test]
    fn test_vulnerabilities_are_logged() {
        let data = Dataset::new(vec![vec![1.0, 0.5], vec![-1.0, 0.5]], vec![1, 0]).unwrap();
        let assessment = RedTeamAssessment::from_config(&RedTeamConfig {
            seed: Some(9),
            ..RedTeamConfig::default()
        })
        .unwrap();
        let report = assessment.run(&LogisticModel::new(vec![3.0, 0.0], 0.0), &data);

        assert!(!report.vulnerabilities.is_empty());
        assert!(logs_contain("probe.finished"));
        assert!(logs_contain("vulnerability.recorded"));
        assert!(logs_contain("redteam.finished"));
    }
}
