//! Lifecycle tracing for assessment runs.

use aicert_core::metrics::METRICS;
use aicert_core::obs::{
    emit_assessment_started, emit_certification_issued, emit_check_failed, emit_check_finished,
    emit_probe_finished, emit_redteam_finished, emit_vulnerability_recorded, AssessmentSpan,
};
use aicert_core::{
    CertificationTier, Dataset, LogisticModel, RedTeamAssessment, RedTeamConfig, Severity,
    ValidationConfig, Validator,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_functions_do_not_panic() {
    let span = AssessmentSpan::start("validation");
    emit_assessment_started(span.run_id(), "subject", 6, 100);
    emit_check_finished("Accuracy Validation", true, 100.0, 3);
    emit_check_failed("Robustness Validation", &"check timed out after 5ms");
    emit_certification_issued(span.run_id(), &CertificationTier::Gold, 88.0, 0.9);
    emit_probe_finished("Bias Detection Test", &Severity::Low, false);
    emit_vulnerability_recorded("Input Boundary Test", "Input Validation", &Severity::High);
    emit_redteam_finished(span.run_id(), 5, 1, 15.0);
}

#[traced_test]
#[test]
fn test_runs_bump_counters() {
    let data = Dataset::new(vec![vec![1.0], vec![-1.0]], vec![1, 0]).unwrap();
    let model = LogisticModel::new(vec![2.0], 0.0);

    let checks_before = METRICS.checks_executed();
    let probes_before = METRICS.probes_executed();

    let config = ValidationConfig {
        seed: Some(1),
        ..ValidationConfig::default()
    };
    Validator::from_config(&config).unwrap().assess(&model, &data);
    RedTeamAssessment::from_config(&RedTeamConfig::default())
        .unwrap()
        .run(&model, &data);

    // Counters are process-wide; other tests may run concurrently.
    assert!(METRICS.checks_executed() >= checks_before + 6);
    assert!(METRICS.probes_executed() >= probes_before + 5);
}
