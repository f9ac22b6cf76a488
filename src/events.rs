//! Lifecycle event payloads and the listener contract.
//!
//! The BDD engine emits six events per run, in a fixed order:
//! `beforeFeature → beforeScenario → (beforeStep → stepResult)* →
//! afterScenario → afterFeature`. The engine awaits every attached
//! listener's handler before moving to the next lifecycle phase, so
//! listeners can rely on strict ordering.

use async_trait::async_trait;
use serde::Serialize;

/// Location of a step definition in its source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Path of the file containing the definition
    pub uri: String,
    /// 1-based line number
    pub line: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    pub fn new(uri: impl Into<String>, line: u32) -> Self {
        Self {
            uri: uri.into(),
            line,
        }
    }
}

/// A feature as reported by the BDD engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    /// Feature name from the feature file header
    pub name: String,
    /// Path of the feature file
    pub uri: String,
}

/// A scenario as reported by the BDD engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Path of the feature file
    pub uri: String,
    /// 1-based line of the scenario keyword
    pub line: u32,
    /// Tags attached to the scenario
    pub tags: Vec<String>,
}

/// A single gherkin step line as reported by the BDD engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Step keyword ("Given", "When", "Then", ...)
    pub keyword: String,
    /// Step text after the keyword
    pub text: String,
    /// Path of the feature file
    pub uri: String,
    /// 1-based line of the step
    pub line: u32,
}

/// Terminal status of a single executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    /// The step body completed without error.
    Passed,
    /// The step body failed after exhausting its retry budget.
    Failed,
    /// The step is marked pending by its definition.
    Pending,
    /// No step definition matched the step text.
    Undefined,
    /// The step was skipped because an earlier step failed.
    Skipped,
}

impl StepStatus {
    /// Returns `true` for [`StepStatus::Failed`].
    pub fn is_failed(&self) -> bool {
        matches!(self, StepStatus::Failed)
    }
}

/// Result of a single executed step, delivered with the `stepResult` event.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// The step this result belongs to
    pub step: Step,
    /// Terminal status of the step
    pub status: StepStatus,
    /// Error message for failed steps
    pub error: Option<String>,
    /// Wall-clock duration of the step in milliseconds
    pub duration_ms: u64,
}

/// A listener attached to the engine's event stream.
///
/// One handler per lifecycle event. All handlers default to no-ops, so an
/// implementation only overrides the events it cares about. The engine
/// awaits each handler before proceeding, which means a slow handler
/// delays the run; handlers must never panic.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Called before a feature starts.
    async fn before_feature(&self, _feature: &Feature) {}

    /// Called after a feature finishes.
    async fn after_feature(&self, _feature: &Feature) {}

    /// Called before a scenario starts.
    async fn before_scenario(&self, _scenario: &Scenario) {}

    /// Called after a scenario finishes.
    async fn after_scenario(&self, _scenario: &Scenario) {}

    /// Called before a step executes.
    async fn before_step(&self, _step: &Step) {}

    /// Called when a step result is available.
    async fn on_step_result(&self, _result: &StepResult) {}
}
