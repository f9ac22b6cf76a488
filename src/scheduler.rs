//! Step wrapping: turns user step bodies into retryable, timeout-bound
//! units the BDD engine can invoke.

use crate::error::AdapterError;
use crate::events::SourceLocation;
use crate::retry::{parse_retry_budget, should_retry, RetryState};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Boxed completion of a single step body invocation.
pub type StepFuture = BoxFuture<'static, Result<(), AdapterError>>;

type BlockingFn = dyn Fn(&[String]) -> Result<(), AdapterError> + Send + Sync;
type ExplicitFn = dyn Fn(Vec<String>) -> StepFuture + Send + Sync;

/// A user-authored step body with a structural execution-mode declaration.
///
/// The variant is the declaration: there is no inference from signatures or
/// parameter names. A [`StepBody::Blocking`] body is written as ordinary
/// sequential code and runs on the runtime's blocking pool, so browser
/// commands that suspend internally read as plain statements. A
/// [`StepBody::Explicit`] body returns its own future and is awaited
/// directly.
///
/// # Examples
///
/// ```
/// use kakehashi::{AdapterError, StepBody};
///
/// let blocking = StepBody::blocking(|args: &[String]| {
///     assert!(!args.is_empty());
///     Ok(())
/// });
///
/// let explicit = StepBody::explicit(|_args| async move { Ok::<_, AdapterError>(()) });
/// ```
#[derive(Clone)]
pub enum StepBody {
    /// Synchronous-looking body run inside the blocking execution context.
    Blocking(Arc<BlockingFn>),
    /// Body that signals its own asynchronous completion.
    Explicit(Arc<ExplicitFn>),
}

impl StepBody {
    /// Creates a blocking-style body from a synchronous closure.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(&[String]) -> Result<(), AdapterError> + Send + Sync + 'static,
    {
        StepBody::Blocking(Arc::new(f))
    }

    /// Creates an explicitly asynchronous body from a future-returning closure.
    pub fn explicit<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), AdapterError>> + Send + 'static,
    {
        StepBody::Explicit(Arc::new(move |args| f(args).boxed()))
    }
}

impl fmt::Debug for StepBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepBody::Blocking(_) => f.write_str("StepBody::Blocking"),
            StepBody::Explicit(_) => f.write_str("StepBody::Explicit"),
        }
    }
}

/// How a step body is scheduled. Fixed at wrap time, never changes during
/// execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run on the blocking pool so internal suspensions look sequential.
    Blocking,
    /// Await the body's own completion directly.
    Explicit,
}

impl ExecutionMode {
    /// Determines the mode from the body's declaration and the run-wide
    /// force-explicit flag.
    pub fn classify(body: &StepBody, force_explicit: bool) -> Self {
        if force_explicit {
            return ExecutionMode::Explicit;
        }
        match body {
            StepBody::Blocking(_) => ExecutionMode::Blocking,
            StepBody::Explicit(_) => ExecutionMode::Explicit,
        }
    }
}

/// Raw per-step options as handed over by the engine at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOptions {
    /// Retry budget as declared in the step definition; absent or
    /// non-numeric means no retry
    pub retry: Option<String>,
    /// Per-step timeout override; the run default applies when absent
    pub timeout: Option<Duration>,
}

/// A registered step definition: pattern, options, wrapped runner, and
/// source location. Immutable once created; owned by the engine thereafter.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    /// The matchable gherkin pattern
    pub pattern: String,
    /// Options the step was registered with
    pub options: StepOptions,
    /// The retryable, timeout-bound runner produced by the scheduler
    pub runner: WrappedStep,
    /// Where the definition lives in user code
    pub location: SourceLocation,
}

/// Produces [`StepDefinition`]s for the engine.
///
/// This is the injection seam: the engine receives a factory at run setup
/// instead of the adapter substituting engine internals, so concurrent runs
/// in one process cannot observe each other's overrides.
pub trait StepDefinitionFactory: Send + Sync {
    /// Creates a definition for one registered step.
    fn create(
        &self,
        pattern: &str,
        options: StepOptions,
        body: StepBody,
        location: SourceLocation,
    ) -> StepDefinition;
}

/// A step body wrapped with retry and timeout handling.
///
/// Matched arguments pass through unchanged, so engine argument injection
/// is unaffected by wrapping.
#[derive(Clone)]
pub struct WrappedStep {
    runner: Arc<dyn Fn(Vec<String>) -> StepFuture + Send + Sync>,
}

impl WrappedStep {
    /// Invokes the step with the engine-matched arguments.
    ///
    /// Resolves with `Ok(())` on success, or with the terminal failure once
    /// the retry budget is exhausted.
    pub async fn invoke(&self, args: Vec<String>) -> Result<(), AdapterError> {
        (self.runner)(args).await
    }
}

impl fmt::Debug for WrappedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WrappedStep")
    }
}

/// Converts step bodies into schedulable units with a timeout and retry
/// budget.
///
/// One scheduler is installed per run as the engine's step-definition
/// factory. The wrap happens once at registration time; retry state is created
/// fresh on every invocation of the wrapped step.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use kakehashi::{StepBody, StepOptions, StepScheduler};
///
/// # #[tokio::main]
/// # async fn main() {
/// let scheduler = StepScheduler::new(Duration::from_secs(30), false);
/// let body = StepBody::blocking(|_args: &[String]| Ok(()));
/// let wrapped = scheduler.wrap("I open {string}", body, &StepOptions::default());
///
/// let result = wrapped.invoke(vec!["https://example.org".to_string()]).await;
/// assert!(result.is_ok());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StepScheduler {
    default_timeout: Duration,
    force_explicit: bool,
}

impl StepScheduler {
    /// Creates a scheduler with the run-wide default timeout and
    /// force-explicit flag.
    pub fn new(default_timeout: Duration, force_explicit: bool) -> Self {
        Self {
            default_timeout,
            force_explicit,
        }
    }

    /// Wraps a step body into a retryable, timeout-bound runner.
    pub fn wrap(&self, pattern: &str, body: StepBody, options: &StepOptions) -> WrappedStep {
        let budget = parse_retry_budget(options.retry.as_deref());
        let step_timeout = options.timeout.unwrap_or(self.default_timeout);
        let mode = ExecutionMode::classify(&body, self.force_explicit);
        let pattern: Arc<str> = Arc::from(pattern);

        debug!(
            pattern = %pattern,
            ?mode,
            retry = budget,
            timeout_ms = step_timeout.as_millis() as u64,
            "wrapped step definition"
        );

        let runner = Arc::new(move |args: Vec<String>| {
            let body = body.clone();
            let pattern = Arc::clone(&pattern);
            run_with_retry(body, mode, args, budget, step_timeout, pattern).boxed()
        });
        WrappedStep { runner }
    }
}

impl StepDefinitionFactory for StepScheduler {
    fn create(
        &self,
        pattern: &str,
        options: StepOptions,
        body: StepBody,
        location: SourceLocation,
    ) -> StepDefinition {
        let runner = self.wrap(pattern, body, &options);
        StepDefinition {
            pattern: pattern.to_string(),
            options,
            runner,
            location,
        }
    }
}

async fn run_with_retry(
    body: StepBody,
    mode: ExecutionMode,
    args: Vec<String>,
    budget: u32,
    step_timeout: Duration,
    pattern: Arc<str>,
) -> Result<(), AdapterError> {
    let mut state = RetryState::new(budget);
    loop {
        match run_attempt(&body, mode, &args, step_timeout, &pattern).await {
            Ok(()) => return Ok(()),
            Err(error) if should_retry(&state) => {
                state.record_failure();
                warn!(
                    "step '{}' failed, retrying ({}/{}): {}",
                    pattern, state.attempts_made, budget, error
                );
            }
            Err(error) => return Err(error),
        }
    }
}

async fn run_attempt(
    body: &StepBody,
    mode: ExecutionMode,
    args: &[String],
    step_timeout: Duration,
    pattern: &str,
) -> Result<(), AdapterError> {
    // Timeout expiry abandons the attempt; a blocking body that already
    // started keeps its worker thread until the closure returns.
    match timeout(step_timeout, execute_once(body, mode, args.to_vec(), pattern)).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::StepTimeout {
            pattern: pattern.to_string(),
            timeout_ms: step_timeout.as_millis() as u64,
        }),
    }
}

async fn execute_once(
    body: &StepBody,
    mode: ExecutionMode,
    args: Vec<String>,
    pattern: &str,
) -> Result<(), AdapterError> {
    match (mode, body) {
        (ExecutionMode::Blocking, StepBody::Blocking(f)) => {
            let f = Arc::clone(f);
            match tokio::task::spawn_blocking(move || f(&args)).await {
                Ok(result) => result,
                Err(join) => Err(step_failed(pattern, join_details(join))),
            }
        }
        // Forced explicit mode: the body runs inline on the async task and
        // the caller accepts that it may block the scheduler.
        (ExecutionMode::Explicit, StepBody::Blocking(f)) => {
            match std::panic::catch_unwind(AssertUnwindSafe(|| f(&args))) {
                Ok(result) => result,
                Err(payload) => Err(step_failed(pattern, panic_details(payload.as_ref()))),
            }
        }
        (_, StepBody::Explicit(f)) => match AssertUnwindSafe(f(args)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(step_failed(pattern, panic_details(payload.as_ref()))),
        },
    }
}

fn step_failed(pattern: &str, details: String) -> AdapterError {
    AdapterError::StepFailed {
        pattern: pattern.to_string(),
        details,
    }
}

fn join_details(error: tokio::task::JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => panic_details(payload.as_ref()),
        Err(error) => error.to_string(),
    }
}

pub(crate) fn panic_details(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "step body panicked".to_string()
    }
}
