//! End-to-end validation: runner, aggregation, certification, report.

use chrono::{DateTime, Utc};

use crate::certify::{Certification, ComplianceStandard};
use crate::config::ValidationConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::metrics::METRICS;
use crate::model::Model;
use crate::obs::{self, AssessmentSpan};
use crate::report::AssessmentReport;
use crate::runner::CheckRunner;
use crate::summary::summarize;

/// Runs a check battery and certifies the outcome.
pub struct Validator {
    subject_name: String,
    standard: ComplianceStandard,
    runner: CheckRunner,
}

impl Validator {
    /// Validator with the standard battery built from `config`.
    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            subject_name: config.subject_name.clone(),
            standard: config.compliance_standard.clone(),
            runner: CheckRunner::from_config(config)?,
        })
    }

    /// Validator over a caller-assembled runner.
    pub fn with_runner(
        subject_name: impl Into<String>,
        standard: ComplianceStandard,
        runner: CheckRunner,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            standard,
            runner,
        }
    }

    pub fn assess(&self, model: &dyn Model, data: &Dataset) -> AssessmentReport {
        self.assess_at(model, data, Utc::now())
    }

    /// Run the battery with an explicit report timestamp.
    pub fn assess_at(
        &self,
        model: &dyn Model,
        data: &Dataset,
        timestamp: DateTime<Utc>,
    ) -> AssessmentReport {
        let span = AssessmentSpan::start("validation");
        obs::emit_assessment_started(span.run_id(), &self.subject_name, self.runner.len(), data.len());

        let tests = self.runner.run(model, data);
        let summary = summarize(&tests);
        let certification =
            Certification::issue(&self.subject_name, &summary, self.standard.clone(), timestamp);

        obs::emit_certification_issued(
            span.run_id(),
            &certification.tier,
            certification.score,
            certification.pass_rate,
        );
        METRICS.flush();

        AssessmentReport {
            subject_name: self.subject_name.clone(),
            timestamp,
            compliance_standard: self.standard.clone(),
            tests,
            summary,
            certification,
        }
    }
}
