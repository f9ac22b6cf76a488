//! The contract the BDD engine must satisfy to be driven by the adapter.
//!
//! The engine itself (feature parsing, gherkin matching, result
//! aggregation) lives outside this crate. The adapter only relies on the
//! injection points below, which replace any global substitution of engine
//! internals: overrides are installed per engine instance and removed when
//! the run finishes, so concurrent runs in one process stay independent.

use crate::config::RunOptions;
use crate::error::AdapterError;
use crate::events::EventListener;
use crate::scheduler::StepDefinitionFactory;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A BDD scenario runtime the orchestrator can drive.
///
/// Implementations must honor the following during [`start`]:
///
/// - every registered step definition is created through the installed
///   factory, and the wrapped runner it returns is what executes the step
///   with the engine-matched arguments;
/// - the default timeout set before the run applies once per execution-tree
///   walk, to every step without its own override;
/// - lifecycle events fire in the fixed order `beforeFeature →
///   beforeScenario → (beforeStep → stepResult)* → afterScenario →
///   afterFeature`, and every attached listener's handler is awaited before
///   the next lifecycle phase begins;
/// - a failure to configure or parse specs surfaces as
///   [`AdapterError::EngineStartup`] before any steps execute.
///
/// [`start`]: ScenarioEngine::start
#[async_trait]
pub trait ScenarioEngine: Send {
    /// Applies the merged run options.
    fn configure(&mut self, options: &RunOptions);

    /// Installs the step-definition factory for the coming run.
    fn install_step_factory(&mut self, factory: Arc<dyn StepDefinitionFactory>);

    /// Removes the installed factory, restoring the engine's own
    /// definition handling.
    fn remove_step_factory(&mut self);

    /// Sets the default step timeout for the coming run.
    fn set_default_timeout(&mut self, timeout: Duration);

    /// Clears the default-timeout override.
    fn clear_default_timeout(&mut self);

    /// Attaches a listener to the engine's event stream.
    fn attach_listener(&mut self, listener: Arc<dyn EventListener>);

    /// Parses the specs and runs every scenario to completion.
    async fn start(&mut self) -> Result<(), AdapterError>;
}
