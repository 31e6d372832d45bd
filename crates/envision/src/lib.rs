//! Idle-time codebase improvement proposals
//!
//! When there is nothing else to do, ask the analysis service for small,
//! focused improvements. Proposals are reported only; nothing is edited.

pub mod analyze;
pub mod improvement;
pub mod report;
pub mod scheduler;

pub use analyze::{analyze, count_files, AnalyzeOptions, EnvisionResult};
pub use improvement::{build_prompt, parse_improvements, Category, CategoryFilter, Improvement};
pub use report::{format_json, format_text};
pub use scheduler::{Scheduler, TickOutcome};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvisionError {
    #[error(transparent)]
    Backend(#[from] agent::BackendError),

    #[error("analysis did not finish within {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Watch(#[from] watcher::WatchError),
}
