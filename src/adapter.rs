//! Top-level run orchestration: configures the engine, installs the step
//! scheduler, wires up listeners, and resolves with the failed-step count.

use crate::config::RunOptions;
use crate::engine::ScenarioEngine;
use crate::error::{AdapterError, HookEvent};
use crate::events::EventListener;
use crate::hooks::{run_hooks, Capabilities, HookEventBridge, HookRegistry, RunOutcome, SuiteContext};
use crate::reporter::{Reporter, ReporterConfig};
use crate::scheduler::StepScheduler;
use std::sync::Arc;
use tracing::info;

/// Lifecycle of a single adapter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, not yet started.
    Idle,
    /// Installing overrides and listeners.
    Configuring,
    /// The engine run is in progress.
    Running,
    /// The run finished and overrides are restored.
    Completed,
}

/// Orchestrates one BDD run for one test worker.
///
/// Each worker owns its own adapter, engine instance, hook registry, and
/// reporter; adapters share no mutable state, so workers can run in
/// parallel within one process.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use kakehashi::{
///     CucumberAdapter, HookRegistry, ReporterConfig, RunOptions, SummaryReporter,
/// };
/// # use kakehashi::ScenarioEngine;
///
/// # async fn demo<E: ScenarioEngine>(engine: E) -> Result<u32, kakehashi::AdapterError> {
/// let options = RunOptions::default();
/// let capabilities = serde_json::json!({ "browserName": "firefox" });
/// let reporter = Arc::new(SummaryReporter::new(&ReporterConfig {
///     capabilities: capabilities.clone(),
///     ignore_undefined_definitions: options.ignore_undefined_definitions,
/// }));
///
/// let mut adapter = CucumberAdapter::new(
///     "0-0",
///     engine,
///     options,
///     vec!["features/login.feature".to_string()],
///     capabilities,
///     HookRegistry::builder().build(),
///     reporter,
/// );
/// let failed = adapter.run().await?;
/// # Ok(failed)
/// # }
/// ```
pub struct CucumberAdapter<E, R> {
    cid: String,
    engine: E,
    options: RunOptions,
    specs: Vec<String>,
    capabilities: Capabilities,
    hooks: HookRegistry,
    reporter: Arc<R>,
    state: RunState,
}

impl<E, R> CucumberAdapter<E, R>
where
    E: ScenarioEngine,
    R: Reporter + 'static,
{
    /// Creates an adapter for one worker.
    ///
    /// `cid` is the worker id, `specs` the feature files assigned to it.
    pub fn new(
        cid: impl Into<String>,
        engine: E,
        options: RunOptions,
        specs: Vec<String>,
        capabilities: Capabilities,
        hooks: HookRegistry,
        reporter: Arc<R>,
    ) -> Self {
        Self {
            cid: cid.into(),
            engine,
            options,
            specs,
            capabilities,
            hooks,
            reporter,
            state: RunState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The worker id this adapter runs for.
    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Borrow of the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The configuration a reporter for this run should be built with.
    pub fn reporter_config(&self) -> ReporterConfig {
        ReporterConfig {
            capabilities: self.capabilities.clone(),
            ignore_undefined_definitions: self.options.ignore_undefined_definitions,
        }
    }

    /// Executes the run and resolves with the failed-step count.
    ///
    /// Engine overrides (step factory and default timeout) are removed
    /// unconditionally once the engine returns, whether it succeeded or
    /// not, so a later run on the same engine sees original behavior.
    /// Suite hook failures are logged and never alter the resolved count;
    /// an engine startup failure propagates after restoration.
    pub async fn run(&mut self) -> Result<u32, AdapterError> {
        self.state = RunState::Configuring;
        info!(cid = %self.cid, specs = self.specs.len(), "configuring BDD run");

        self.engine.configure(&self.options);
        let scheduler = StepScheduler::new(self.options.timeout(), self.options.force_explicit);
        self.engine.install_step_factory(Arc::new(scheduler));
        self.engine.set_default_timeout(self.options.timeout());

        self.engine
            .attach_listener(Arc::clone(&self.reporter) as Arc<dyn EventListener>);
        self.engine
            .attach_listener(Arc::new(HookEventBridge::new(self.hooks.clone())));

        let suite = SuiteContext {
            capabilities: self.capabilities.clone(),
            specs: self.specs.clone(),
        };
        run_hooks(HookEvent::BeforeRun, self.hooks.before_run_hooks(), &suite).await;

        self.state = RunState::Running;
        let started = self.engine.start().await;

        self.engine.remove_step_factory();
        self.engine.clear_default_timeout();
        self.state = RunState::Completed;

        started?;

        let failed = self.reporter.failed_count();
        let outcome = RunOutcome {
            failed,
            capabilities: self.capabilities.clone(),
            specs: self.specs.clone(),
        };
        run_hooks(HookEvent::AfterRun, self.hooks.after_run_hooks(), &outcome).await;

        info!(cid = %self.cid, failed, "BDD run finished");
        Ok(failed)
    }
}
