//! User hook registration and the bridge that feeds lifecycle events into
//! those hooks.
//!
//! Hook failures are operational (a screenshot hook losing its connection,
//! say) and must never mask or abort the actual test outcome. Every
//! callback error or panic is caught here, logged with its event name, and
//! dropped.

use crate::error::{AdapterError, HookEvent};
use crate::events::{EventListener, Feature, Scenario, Step, StepResult};
use crate::scheduler::panic_details;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;

/// Free-form capabilities object describing the browser session, as passed
/// through to suite hooks.
pub type Capabilities = serde_json::Value;

/// Arguments handed to `beforeRun` hooks.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteContext {
    /// Browser capabilities for this worker
    pub capabilities: Capabilities,
    /// Feature files assigned to this worker
    pub specs: Vec<String>,
}

/// Arguments handed to `afterRun` hooks.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Number of failed steps in the finished run
    pub failed: u32,
    /// Browser capabilities for this worker
    pub capabilities: Capabilities,
    /// Feature files assigned to this worker
    pub specs: Vec<String>,
}

type HookFn<P> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<(), AdapterError>> + Send + Sync>;

fn boxed_hook<P, F, Fut>(hook: F) -> HookFn<P>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), AdapterError>> + Send + 'static,
{
    Arc::new(move |payload| hook(payload).boxed())
}

/// Ordered user hook callbacks, one slot per lifecycle event plus the two
/// suite-level slots.
///
/// Built once before the run via [`HookRegistry::builder`] and read-only
/// afterwards.
///
/// # Examples
///
/// ```
/// use kakehashi::HookRegistry;
///
/// let registry = HookRegistry::builder()
///     .before_scenario(|scenario| async move {
///         println!("starting {}", scenario.name);
///         Ok(())
///     })
///     .after_step(|result| async move {
///         println!("step finished: {:?}", result.status);
///         Ok(())
///     })
///     .build();
/// ```
#[derive(Clone, Default)]
pub struct HookRegistry {
    before_feature: Vec<HookFn<Feature>>,
    after_feature: Vec<HookFn<Feature>>,
    before_scenario: Vec<HookFn<Scenario>>,
    after_scenario: Vec<HookFn<Scenario>>,
    before_step: Vec<HookFn<Step>>,
    after_step: Vec<HookFn<StepResult>>,
    before_run: Vec<HookFn<SuiteContext>>,
    after_run: Vec<HookFn<RunOutcome>>,
}

impl HookRegistry {
    /// Creates a builder for registering hooks.
    pub fn builder() -> HookRegistryBuilder {
        HookRegistryBuilder::default()
    }

    pub(crate) fn before_run_hooks(&self) -> &[HookFn<SuiteContext>] {
        &self.before_run
    }

    pub(crate) fn after_run_hooks(&self) -> &[HookFn<RunOutcome>] {
        &self.after_run
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("before_feature", &self.before_feature.len())
            .field("after_feature", &self.after_feature.len())
            .field("before_scenario", &self.before_scenario.len())
            .field("after_scenario", &self.after_scenario.len())
            .field("before_step", &self.before_step.len())
            .field("after_step", &self.after_step.len())
            .field("before_run", &self.before_run.len())
            .field("after_run", &self.after_run.len())
            .finish()
    }
}

/// Builder for [`HookRegistry`]. Hooks run in registration order.
#[derive(Default)]
pub struct HookRegistryBuilder {
    registry: HookRegistry,
}

macro_rules! register {
    ($(#[$doc:meta])* $name:ident, $payload:ty) => {
        $(#[$doc])*
        pub fn $name<F, Fut>(mut self, hook: F) -> Self
        where
            F: Fn($payload) -> Fut + Send + Sync + 'static,
            Fut: std::future::Future<Output = Result<(), AdapterError>> + Send + 'static,
        {
            self.registry.$name.push(boxed_hook(hook));
            self
        }
    };
}

impl HookRegistryBuilder {
    register!(
        /// Registers a hook that runs before each feature.
        before_feature,
        Feature
    );
    register!(
        /// Registers a hook that runs after each feature.
        after_feature,
        Feature
    );
    register!(
        /// Registers a hook that runs before each scenario.
        before_scenario,
        Scenario
    );
    register!(
        /// Registers a hook that runs after each scenario.
        after_scenario,
        Scenario
    );
    register!(
        /// Registers a hook that runs before each step.
        before_step,
        Step
    );
    register!(
        /// Registers a hook that runs on each step result.
        after_step,
        StepResult
    );
    register!(
        /// Registers a hook that runs once before the suite starts.
        before_run,
        SuiteContext
    );
    register!(
        /// Registers a hook that runs once after the suite finishes.
        after_run,
        RunOutcome
    );

    /// Finalizes the registry.
    pub fn build(self) -> HookRegistry {
        self.registry
    }
}

/// Runs all hooks for one event in registration order, awaiting each.
///
/// A callback that errors or panics is logged and skipped; the remaining
/// callbacks for the event still run. Nothing propagates to the caller.
pub(crate) async fn run_hooks<P: Clone>(event: HookEvent, hooks: &[HookFn<P>], payload: &P) {
    for hook in hooks {
        match AssertUnwindSafe(hook(payload.clone())).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(cause)) => log_hook_failure(event, cause.to_string()),
            Err(payload) => log_hook_failure(event, panic_details(payload.as_ref())),
        }
    }
}

fn log_hook_failure(event: HookEvent, details: String) {
    let failure = AdapterError::HookFailed { event, details };
    error!("{}", failure);
}

/// Forwards BDD lifecycle events to the user hooks registered for them.
///
/// Attached to the engine as an ordinary [`EventListener`]. The engine
/// awaits each handler, so all hooks for an event complete before the next
/// lifecycle phase begins.
#[derive(Debug)]
pub struct HookEventBridge {
    hooks: HookRegistry,
}

impl HookEventBridge {
    /// Creates a bridge over the given registry.
    pub fn new(hooks: HookRegistry) -> Self {
        Self { hooks }
    }
}

#[async_trait]
impl EventListener for HookEventBridge {
    async fn before_feature(&self, feature: &Feature) {
        run_hooks(HookEvent::BeforeFeature, &self.hooks.before_feature, feature).await;
    }

    async fn after_feature(&self, feature: &Feature) {
        run_hooks(HookEvent::AfterFeature, &self.hooks.after_feature, feature).await;
    }

    async fn before_scenario(&self, scenario: &Scenario) {
        run_hooks(
            HookEvent::BeforeScenario,
            &self.hooks.before_scenario,
            scenario,
        )
        .await;
    }

    async fn after_scenario(&self, scenario: &Scenario) {
        run_hooks(
            HookEvent::AfterScenario,
            &self.hooks.after_scenario,
            scenario,
        )
        .await;
    }

    async fn before_step(&self, step: &Step) {
        run_hooks(HookEvent::BeforeStep, &self.hooks.before_step, step).await;
    }

    async fn on_step_result(&self, result: &StepResult) {
        run_hooks(HookEvent::AfterStep, &self.hooks.after_step, result).await;
    }
}
