//! Structured lifecycle events for assessment runs.
//!
//! Every event carries an `event` key so log pipelines can filter on it.
//! Runs are wrapped in an [`AssessmentSpan`] tagged with a fresh run id.

use tracing::{info, warn};
use uuid::Uuid;

/// RAII guard holding a run-scoped span open.
pub struct AssessmentSpan {
    run_id: String,
    _span: tracing::span::EnteredSpan,
}

impl AssessmentSpan {
    /// Enter a span tagged with `run_id` and `kind` (`validation` / `red_team`).
    pub fn enter(run_id: &str, kind: &str) -> Self {
        let span = tracing::info_span!("aicert.assessment", run_id = %run_id, kind = %kind);
        Self {
            run_id: run_id.to_string(),
            _span: span.entered(),
        }
    }

    /// Enter a span with a newly generated v4 run id.
    pub fn start(kind: &str) -> Self {
        Self::enter(&Uuid::new_v4().to_string(), kind)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

pub fn emit_assessment_started(run_id: &str, subject: &str, checks: usize, rows: usize) {
    info!(
        event = "assessment.started",
        run_id = %run_id,
        subject = %subject,
        checks = checks,
        rows = rows,
    );
}

pub fn emit_check_finished(name: &str, passed: bool, score: f64, duration_ms: u64) {
    info!(
        event = "check.finished",
        check = %name,
        passed = passed,
        score = score,
        duration_ms = duration_ms,
    );
}

/// A check errored, panicked, or ran out of time.
pub fn emit_check_failed(name: &str, error: &dyn std::fmt::Display) {
    warn!(event = "check.failed", check = %name, error = %error);
}

pub fn emit_certification_issued(
    run_id: &str,
    tier: &dyn std::fmt::Display,
    score: f64,
    pass_rate: f64,
) {
    info!(
        event = "certification.issued",
        run_id = %run_id,
        tier = %tier,
        score = score,
        pass_rate = pass_rate,
    );
}

pub fn emit_probe_finished(name: &str, severity: &dyn std::fmt::Display, vulnerable: bool) {
    info!(
        event = "probe.finished",
        probe = %name,
        severity = %severity,
        vulnerable = vulnerable,
    );
}

pub fn emit_vulnerability_recorded(name: &str, category: &str, severity: &dyn std::fmt::Display) {
    warn!(
        event = "vulnerability.recorded",
        probe = %name,
        category = %category,
        severity = %severity,
    );
}

pub fn emit_redteam_finished(run_id: &str, total: usize, vulnerabilities: usize, risk_score: f64) {
    info!(
        event = "redteam.finished",
        run_id = %run_id,
        total_tests = total,
        vulnerabilities = vulnerabilities,
        risk_score = risk_score,
    );
}
