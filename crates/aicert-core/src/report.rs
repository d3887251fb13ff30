//! Assessment report and its text renderings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::certify::{Certification, ComplianceStandard};
use crate::error::Result;
use crate::runner::CheckRecord;
use crate::summary::Summary;

const RULE_WIDTH: usize = 70;

/// Result of one validation run. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub subject_name: String,
    pub timestamp: DateTime<Utc>,
    pub compliance_standard: ComplianceStandard,
    /// One record per registered check, in registration order.
    pub tests: Vec<CheckRecord>,
    pub summary: Summary,
    pub certification: Certification,
}

impl AssessmentReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(RULE_WIDTH).collect()
}

/// Console summary: totals, category breakdown and the certification block.
pub fn render_summary(report: &AssessmentReport) -> String {
    let s = &report.summary;
    let cert = &report.certification;
    let mut out = String::new();

    out.push_str(&format!("{}\nVALIDATION SUMMARY\n{}\n", rule('='), rule('=')));
    out.push_str(&format!("Total Tests: {}\n", s.total_tests));
    out.push_str(&format!("Passed: {}\n", s.passed_tests));
    out.push_str(&format!("Failed: {}\n", s.failed_tests));
    out.push_str(&format!("Pass Rate: {:.1}%\n", s.pass_rate * 100.0));
    out.push_str(&format!("Weighted Score: {:.2}/100\n", s.weighted_score));

    out.push_str("\nCategory Breakdown:\n");
    for (category, stats) in &s.category_breakdown {
        out.push_str(&format!(
            "  {}: {}/{} passed\n",
            category, stats.passed, stats.total
        ));
    }

    out.push_str(&format!("\n{}\nCERTIFICATION\n{}\n", rule('='), rule('=')));
    out.push_str(&format!("Level: {}\n", cert.tier));
    out.push_str(&format!("Certificate ID: {}\n", cert.certificate_id));
    out.push_str(&format!("Score: {:.2}/100\n", cert.score));
    out.push_str(&format!("Issued: {}\n", cert.issued_date.to_rfc3339()));
    out.push_str(&format!("Valid Until: {}\n", cert.valid_until.to_rfc3339()));
    out.push_str(&format!("Standard: {}\n", cert.compliance_standard));
    out.push_str(&rule('='));
    out.push('\n');
    out
}

/// Plain-text certificate document.
pub fn render_certificate(report: &AssessmentReport) -> String {
    let cert = &report.certification;
    let outcome = if cert.tier.is_certified() {
        "has successfully completed security validation and compliance assessment"
    } else {
        "has completed security validation and compliance assessment, without\nmeeting the requirements for certification,"
    };

    format!(
        "{rule}
{title:^width$}
{rule}

This certifies that the AI system:

    {subject}

{outcome}
according to the {standard}.

CERTIFICATION LEVEL: {tier}
CERTIFICATE ID: {id}
VALIDATION SCORE: {score:.2}/100
PASS RATE: {pass_rate:.1}%

ISSUED: {issued}
VALID UNTIL: {valid_until}

This certificate validates that the AI system meets the security,
performance, fairness, and governance requirements of the specified
compliance standard as of the validation date.

{rule}
{footer:^width$}
{rule}
",
        rule = rule('='),
        title = "CERTIFICATE OF VALIDATION",
        footer = "AI Security Validation Platform",
        width = RULE_WIDTH,
        subject = report.subject_name,
        outcome = outcome,
        standard = cert.compliance_standard,
        tier = cert.tier,
        id = cert.certificate_id,
        score = cert.score,
        pass_rate = cert.pass_rate * 100.0,
        issued = cert.issued_date.to_rfc3339(),
        valid_until = cert.valid_until.to_rfc3339(),
    )
}
