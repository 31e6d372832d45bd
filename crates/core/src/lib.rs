//! Shared building blocks for Vigil
//!
//! This crate provides:
//! - Session configuration (`vigil.toml`)
//! - Markdown backlog scanning (TODO.md / PLAN.md / CLAUDE.md)
//! - Append-only token usage ledger

pub mod config;
pub mod tasks;
pub mod usage;

// Re-exports
pub use config::{AgentConfig, ConfigError, EnvisionConfig, VigilConfig, WatchConfig};
pub use tasks::{has_pending_tasks, pending_tasks, Priority, Task};
pub use usage::{LedgerError, UsageEntry, UsageKind, UsageLedger, UsageSummary, UsageTotals};

/// Directory (relative to the watch root) holding Vigil state files
pub const STATE_DIR: &str = ".vigil";
