//! Process-wide counters for assessment runs.
//!
//! Counters are bumped silently at the call site; [`Metrics::flush`] emits
//! them as one `tracing::info!` event at the end of a run.

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

/// Atomic counters, no locking.
pub struct Metrics {
    checks_executed: AtomicU64,
    checks_failed: AtomicU64,
    probes_executed: AtomicU64,
    vulnerabilities_recorded: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            checks_executed: AtomicU64::new(0),
            checks_failed: AtomicU64::new(0),
            probes_executed: AtomicU64::new(0),
            vulnerabilities_recorded: AtomicU64::new(0),
        }
    }

    pub fn inc_checks_executed(&self) {
        self.checks_executed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "checks_executed", "counter incremented");
    }

    /// Counts checks that did not pass, including errored ones.
    pub fn inc_checks_failed(&self) {
        self.checks_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "checks_failed", "counter incremented");
    }

    pub fn inc_probes_executed(&self) {
        self.probes_executed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "probes_executed", "counter incremented");
    }

    pub fn inc_vulnerabilities(&self) {
        self.vulnerabilities_recorded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "vulnerabilities_recorded", "counter incremented");
    }

    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            checks_executed = self.checks_executed(),
            checks_failed = self.checks_failed(),
            probes_executed = self.probes_executed(),
            vulnerabilities_recorded = self.vulnerabilities_recorded(),
        );
    }

    pub fn checks_executed(&self) -> u64 {
        self.checks_executed.load(Ordering::Relaxed)
    }

    pub fn checks_failed(&self) -> u64 {
        self.checks_failed.load(Ordering::Relaxed)
    }

    pub fn probes_executed(&self) -> u64 {
        self.probes_executed.load(Ordering::Relaxed)
    }

    pub fn vulnerabilities_recorded(&self) -> u64 {
        self.vulnerabilities_recorded.load(Ordering::Relaxed)
    }

    /// Zero every counter (tests).
    pub fn reset(&self) {
        self.checks_executed.store(0, Ordering::Relaxed);
        self.checks_failed.store(0, Ordering::Relaxed);
        self.probes_executed.store(0, Ordering::Relaxed);
        self.vulnerabilities_recorded.store(0, Ordering::Relaxed);
    }
}
