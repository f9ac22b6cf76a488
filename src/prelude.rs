//! Commonly used types and traits

pub use crate::adapter::{CucumberAdapter, RunState};
pub use crate::config::RunOptions;
pub use crate::engine::ScenarioEngine;
pub use crate::error::AdapterError;
pub use crate::events::EventListener;
pub use crate::hooks::HookRegistry;
pub use crate::reporter::{Reporter, ReporterConfig, SummaryReporter};
pub use crate::scheduler::{StepBody, StepOptions, StepScheduler};
