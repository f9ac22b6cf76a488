use thiserror::Error;

/// The lifecycle event a hook callback was registered for.
///
/// Used in [`AdapterError::HookFailed`] and in log output to identify
/// which hook slot produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// Runs before each feature starts.
    BeforeFeature,
    /// Runs after each feature finishes.
    AfterFeature,
    /// Runs before each scenario starts.
    BeforeScenario,
    /// Runs after each scenario finishes.
    AfterScenario,
    /// Runs before each step executes.
    BeforeStep,
    /// Runs after each step result is available.
    AfterStep,
    /// Runs once before the whole suite, with capabilities and specs.
    BeforeRun,
    /// Runs once after the whole suite, with the run outcome.
    AfterRun,
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HookEvent::BeforeFeature => "beforeFeature",
            HookEvent::AfterFeature => "afterFeature",
            HookEvent::BeforeScenario => "beforeScenario",
            HookEvent::AfterScenario => "afterScenario",
            HookEvent::BeforeStep => "beforeStep",
            HookEvent::AfterStep => "afterStep",
            HookEvent::BeforeRun => "beforeRun",
            HookEvent::AfterRun => "afterRun",
        };
        write!(f, "{}", name)
    }
}

/// Errors that can occur while bridging a BDD run.
///
/// # Non-Exhaustive
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code. When matching
/// on this error, always include a wildcard pattern:
///
/// ```
/// use kakehashi::AdapterError;
///
/// fn describe(error: &AdapterError) -> String {
///     match error {
///         AdapterError::StepFailed { pattern, details } => {
///             format!("step '{}' failed: {}", pattern, details)
///         }
///         AdapterError::StepTimeout { pattern, timeout_ms } => {
///             format!("step '{}' exceeded {}ms", pattern, timeout_ms)
///         }
///         other => other.to_string(),
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AdapterError {
    /// A step body returned an error or panicked.
    ///
    /// Produced per attempt; becomes the step's terminal outcome once the
    /// retry budget is exhausted.
    #[error("step '{pattern}' failed: {details}")]
    StepFailed {
        /// The gherkin pattern of the failing step definition
        pattern: String,
        /// Details about the failure
        details: String,
    },

    /// A step attempt exceeded its timeout.
    ///
    /// Subject to the same retry rule as an ordinary failure.
    #[error("step '{pattern}' timed out after {timeout_ms}ms")]
    StepTimeout {
        /// The gherkin pattern of the step definition that timed out
        pattern: String,
        /// The configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// A lifecycle hook callback failed.
    ///
    /// Always caught at the bridge boundary and logged. Hook failures never
    /// abort the run and never alter step results.
    #[error("{event} hook has thrown an error: {details}")]
    HookFailed {
        /// The lifecycle event the hook was registered for
        event: HookEvent,
        /// Details about the failure
        details: String,
    },

    /// The BDD engine failed to configure or start.
    ///
    /// Fatal: aborts the run before any steps execute.
    #[error("engine failed to start: {0}")]
    EngineStartup(String),

    /// The run configuration is invalid.
    #[error("invalid run configuration: {0}")]
    Configuration(String),
}
