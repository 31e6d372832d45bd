//! Change review agent
//!
//! Sends settled file changes to the analysis service, shows the proposed
//! fix, and applies it only after the operator approves.

pub mod backend;
pub mod monitor;
pub mod orchestrator;
pub mod verdict;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Backend, BackendError, ClaudeCli, Mode, Query, Reply, Usage};
pub use monitor::run as run_monitor;
pub use orchestrator::{section, Orchestrator, Prompter, Review, SessionStats, TerminalPrompter};
pub use verdict::Verdict;
