//! Run options recognized by the adapter.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-step timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default formatter name.
pub const DEFAULT_FORMAT: &str = "pretty";

/// Options controlling the BDD engine for one run.
///
/// User-supplied options merge over the defaults through ordinary struct
/// construction:
///
/// ```
/// use kakehashi::RunOptions;
///
/// let options = RunOptions {
///     fail_fast: true,
///     tags: vec!["@smoke".to_string()],
///     ..RunOptions::default()
/// };
/// assert_eq!(options.timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunOptions {
    /// Show full backtrace for errors
    pub backtrace: bool,
    /// "extension:module" pairs to load before requiring support files
    pub compiler: Vec<String>,
    /// Invoke formatters without executing steps
    pub dry_run: bool,
    /// Abort the run on first failure
    pub fail_fast: bool,
    /// Output formats, "type[:path]" (repeatable)
    pub format: Vec<String>,
    /// Only execute scenarios whose name matches one of these expressions
    pub name: Vec<String>,
    /// Colorize formatter output
    pub colors: bool,
    /// Show step definition snippets for pending steps
    pub snippets: bool,
    /// Show source uris in output
    pub source: bool,
    /// Configuration profiles to apply
    pub profile: Vec<String>,
    /// Files or directories to require before executing features
    pub require: Vec<String>,
    /// Custom snippet syntax name
    pub snippet_syntax: Option<String>,
    /// Fail if there are any undefined or pending steps
    pub strict: bool,
    /// Only execute features or scenarios with matching tags
    pub tags: Vec<String>,
    /// Default timeout for step definitions, in milliseconds
    pub timeout_ms: u64,
    /// Schedule every step body in explicit mode, regardless of its
    /// declaration
    pub force_explicit: bool,
    /// Do not report undefined step definitions as failures
    pub ignore_undefined_definitions: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            backtrace: false,
            compiler: Vec::new(),
            dry_run: false,
            fail_fast: false,
            format: vec![DEFAULT_FORMAT.to_string()],
            name: Vec::new(),
            colors: true,
            snippets: true,
            source: true,
            profile: Vec::new(),
            require: Vec::new(),
            snippet_syntax: None,
            strict: false,
            tags: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            force_explicit: false,
            ignore_undefined_definitions: false,
        }
    }
}

impl RunOptions {
    /// The default step timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
