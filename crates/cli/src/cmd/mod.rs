//! CLI command implementations

pub mod config;
pub mod envision;
pub mod schedule;
pub mod tasks;
pub mod usage;
pub mod watch;
