//! Workflow integration tests
//!
//! Each module drives the built binary against a throwaway project.

pub mod backlog;
pub mod configuration;
pub mod envision_run;
pub mod startup;
