//! The reporter boundary: aggregates lifecycle events into a failed-step
//! count.
//!
//! Full progress output and formatting live outside this crate; the
//! orchestrator only needs the aggregate count after the run.

use crate::events::{EventListener, StepResult, StepStatus};
use crate::hooks::Capabilities;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{info, warn};

/// Run configuration handed to a reporter.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Browser capabilities for this worker
    pub capabilities: Capabilities,
    /// Whether undefined step definitions are reported as failures
    pub ignore_undefined_definitions: bool,
}

/// An event listener that exposes an aggregate failed-step count after the
/// run completes.
pub trait Reporter: EventListener {
    /// Number of failed steps observed so far.
    fn failed_count(&self) -> u32;
}

/// Minimal [`Reporter`]: counts failed steps and logs results.
///
/// Undefined steps count as failures unless the config says to ignore them.
#[derive(Debug)]
pub struct SummaryReporter {
    ignore_undefined_definitions: bool,
    failed: AtomicU32,
}

impl SummaryReporter {
    /// Creates a reporter from its run configuration.
    pub fn new(config: &ReporterConfig) -> Self {
        Self {
            ignore_undefined_definitions: config.ignore_undefined_definitions,
            failed: AtomicU32::new(0),
        }
    }

    fn counts_as_failure(&self, status: StepStatus) -> bool {
        match status {
            StepStatus::Failed => true,
            StepStatus::Undefined => !self.ignore_undefined_definitions,
            StepStatus::Passed | StepStatus::Pending | StepStatus::Skipped => false,
        }
    }
}

#[async_trait]
impl EventListener for SummaryReporter {
    async fn on_step_result(&self, result: &StepResult) {
        if self.counts_as_failure(result.status) {
            self.failed.fetch_add(1, Ordering::SeqCst);
            warn!(
                "step '{} {}' failed: {}",
                result.step.keyword,
                result.step.text,
                result.error.as_deref().unwrap_or("no error detail")
            );
        } else {
            info!(
                "step '{} {}' finished: {:?}",
                result.step.keyword, result.step.text, result.status
            );
        }
    }
}

impl Reporter for SummaryReporter {
    fn failed_count(&self) -> u32 {
        self.failed.load(Ordering::SeqCst)
    }
}
