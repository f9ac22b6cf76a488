//! Retry bookkeeping for step attempts.

/// Per-invocation retry state.
///
/// Created fresh every time a wrapped step is invoked (not per scenario),
/// mutated only by the scheduler recording failed attempts, and discarded
/// once the step succeeds or the budget is exhausted.
///
/// # Examples
///
/// ```
/// use kakehashi::{should_retry, RetryState};
///
/// let mut state = RetryState::new(2);
/// assert!(should_retry(&state));
/// state.record_failure();
/// state.record_failure();
/// assert!(!should_retry(&state));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Number of failed attempts recorded so far
    pub attempts_made: u32,
    /// Maximum number of re-attempts after the first failure
    pub max_retries: u32,
}

impl RetryState {
    /// Creates a fresh state with no attempts recorded.
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempts_made: 0,
            max_retries,
        }
    }

    /// Records one failed attempt.
    pub fn record_failure(&mut self) {
        self.attempts_made += 1;
    }
}

/// Decides whether a failed attempt should be re-run.
///
/// Pure: `attempts_made < max_retries`, nothing else. A budget of `R`
/// therefore allows exactly `R + 1` invocations in total.
pub fn should_retry(state: &RetryState) -> bool {
    state.attempts_made < state.max_retries
}

/// Parses the per-step retry option into a budget.
///
/// The engine hands step options over as raw strings. Absent, non-numeric,
/// or negative values all mean no retry.
///
/// # Examples
///
/// ```
/// use kakehashi::parse_retry_budget;
///
/// assert_eq!(parse_retry_budget(Some("3")), 3);
/// assert_eq!(parse_retry_budget(Some("-2")), 0);
/// assert_eq!(parse_retry_budget(Some("lots")), 0);
/// assert_eq!(parse_retry_budget(None), 0);
/// ```
pub fn parse_retry_budget(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0)
}
