//! # Kakehashi (架け橋)
//!
//! A bridge between a BDD scenario runtime and a browser-automation
//! execution engine.
//!
//! The name "Kakehashi" (架け橋) means "bridge" in Japanese: this crate
//! sits between the two runtimes, re-routing every step-definition
//! invocation and lifecycle event so that browser commands issued inside a
//! step run correctly whether the step is written as blocking-style
//! sequential code or as an explicitly asynchronous function.
//!
//! ## Features
//!
//! - **Structural execution modes**: a step declares how it completes via
//!   [`StepBody::Blocking`] or [`StepBody::Explicit`] instead of fragile
//!   signature heuristics
//! - **Per-step retry**: failed attempts (including timeouts) are re-run
//!   immediately up to the step's retry budget
//! - **Configurable timeouts**: every attempt is bound by the step's own
//!   timeout or the run default (30s)
//! - **Isolated hooks**: a typed [`HookRegistry`] feeds lifecycle events to
//!   user callbacks; a failing hook is logged and never fails the scenario
//! - **Injected engine contract**: the [`ScenarioEngine`] receives its
//!   step factory and timeout override explicitly and gets them removed
//!   when the run ends, keeping parallel workers independent
//!
//! ## Wrapping a step
//!
//! ```rust
//! use std::time::Duration;
//! use kakehashi::{StepBody, StepOptions, StepScheduler};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let scheduler = StepScheduler::new(Duration::from_secs(30), false);
//!
//! let body = StepBody::blocking(|args: &[String]| {
//!     // browser commands go here; suspensions read as plain statements
//!     assert_eq!(args[0], "login page");
//!     Ok(())
//! });
//!
//! let options = StepOptions {
//!     retry: Some("2".to_string()),
//!     timeout: None,
//! };
//! let wrapped = scheduler.wrap("I open the {string}", body, &options);
//!
//! wrapped
//!     .invoke(vec!["login page".to_string()])
//!     .await
//!     .expect("step passes");
//! # }
//! ```
//!
//! ## Registering hooks
//!
//! ```rust
//! use kakehashi::HookRegistry;
//!
//! let hooks = HookRegistry::builder()
//!     .before_scenario(|scenario| async move {
//!         tracing::info!("starting scenario '{}'", scenario.name);
//!         Ok(())
//!     })
//!     .after_run(|outcome| async move {
//!         tracing::info!("suite finished with {} failed steps", outcome.failed);
//!         Ok(())
//!     })
//!     .build();
//! ```
//!
//! ## Running a suite
//!
//! Construct a [`CucumberAdapter`] with an engine implementation, the run
//! options, the hook registry, and a reporter, then call
//! [`CucumberAdapter::run`]. It resolves with the failed-step count after
//! restoring the engine's original behavior.

mod adapter;
mod config;
mod engine;
mod error;
mod events;
mod hooks;
mod reporter;
mod retry;
mod scheduler;

pub mod prelude;

pub use adapter::{CucumberAdapter, RunState};
pub use config::{RunOptions, DEFAULT_FORMAT, DEFAULT_TIMEOUT_MS};
pub use engine::ScenarioEngine;
pub use error::{AdapterError, HookEvent};
pub use events::{EventListener, Feature, Scenario, SourceLocation, Step, StepResult, StepStatus};
pub use hooks::{
    Capabilities, HookEventBridge, HookRegistry, HookRegistryBuilder, RunOutcome, SuiteContext,
};
pub use reporter::{Reporter, ReporterConfig, SummaryReporter};
pub use retry::{parse_retry_budget, should_retry, RetryState};
pub use scheduler::{
    ExecutionMode, StepBody, StepDefinition, StepDefinitionFactory, StepFuture, StepOptions,
    StepScheduler, WrappedStep,
};
