//! Ordered check registry with failure isolation.
//!
//! # Failure isolation
//!
//! - Check error: recorded as a failed result, score 0, `details.error` set
//! - Check panic: caught with `catch_unwind`, recorded the same way
//! - Time budget exceeded: the finished outcome is discarded and replaced by
//!   a failed result (checks are synchronous, so the budget is enforced after
//!   the check returns)
//!
//! Every registered check yields exactly one record, in registration order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::check::{self, details, CheckOutcome, Details, ValidationCheck};
use crate::config::ValidationConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::metrics::METRICS;
use crate::model::Model;
use crate::obs;

/// One check's entry in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub category: String,
    pub weight: f64,
    pub passed: bool,
    pub score: f64,
    pub details: Details,
}

impl CheckRecord {
    fn failed(check: &dyn ValidationCheck, error: String) -> Self {
        let meta = check.meta();
        Self {
            name: meta.name.clone(),
            category: meta.category.clone(),
            weight: meta.weight(),
            passed: false,
            score: 0.0,
            details: details([("error", json!(error))]),
        }
    }

    fn from_outcome(check: &dyn ValidationCheck, outcome: CheckOutcome) -> Self {
        let meta = check.meta();
        Self {
            name: meta.name.clone(),
            category: meta.category.clone(),
            weight: meta.weight(),
            passed: outcome.passed,
            score: outcome.score,
            details: outcome.details,
        }
    }
}

#[derive(Default)]
pub struct CheckRunner {
    checks: Vec<Box<dyn ValidationCheck>>,
    time_budget: Option<Duration>,
}

impl CheckRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner loaded with the standard battery and the configured time budget.
    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        let mut runner = Self::new();
        for c in check::standard_battery(config)? {
            runner.register(c);
        }
        runner.time_budget = config.check_timeout_ms.map(Duration::from_millis);
        Ok(runner)
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Append a check; it runs after every check registered before it.
    pub fn register(&mut self, check: Box<dyn ValidationCheck>) -> &mut Self {
        self.checks.push(check);
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check in registration order.
    pub fn run(&self, model: &dyn Model, data: &Dataset) -> Vec<CheckRecord> {
        self.checks
            .iter()
            .map(|c| self.run_one(c.as_ref(), model, data))
            .collect()
    }

    fn run_one(&self, check: &dyn ValidationCheck, model: &dyn Model, data: &Dataset) -> CheckRecord {
        let name = check.meta().name.clone();
        tracing::debug!(check = %name, "running check");

        let start = Instant::now();
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| check.run(model, data)));
        let elapsed = start.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        METRICS.inc_checks_executed();

        let record = match attempt {
            Ok(Ok(_)) if self.time_budget.is_some_and(|budget| elapsed > budget) => {
                let error = format!("check timed out after {}ms", elapsed_ms);
                obs::emit_check_failed(&name, &error);
                CheckRecord::failed(check, error)
            }
            Ok(Ok(outcome)) => CheckRecord::from_outcome(check, outcome),
            Ok(Err(e)) => {
                obs::emit_check_failed(&name, &e);
                CheckRecord::failed(check, e.to_string())
            }
            Err(payload) => {
                let error = format!("check panicked: {}", panic_message(payload.as_ref()));
                obs::emit_check_failed(&name, &error);
                CheckRecord::failed(check, error)
            }
        };

        if !record.passed {
            METRICS.inc_checks_failed();
        }
        obs::emit_check_finished(&name, record.passed, record.score, elapsed_ms);
        record
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
