//! Idle-time scheduling
//!
//! Envision only runs when the backlog is empty: every interval the scheduler
//! checks TODO.md, PLAN.md and CLAUDE.md and skips the run if anything is
//! pending.

use crate::analyze::{analyze, AnalyzeOptions};
use crate::report::format_text;
use crate::EnvisionError;
use agent::Backend;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use vigil_core::{pending_tasks, AgentConfig, UsageEntry, UsageKind, UsageLedger, VigilConfig};

/// What one scheduler tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Backlog had work; no analysis ran
    Skipped { pending: usize },
    /// Analysis ran and reported this many improvements
    Ran { improvements: usize },
}

pub struct Scheduler {
    root: PathBuf,
    backend: Arc<dyn Backend>,
    options: AnalyzeOptions,
    agent: AgentConfig,
    interval: Duration,
    ledger: Option<UsageLedger>,
}

impl Scheduler {
    pub fn new(root: &Path, config: &VigilConfig, backend: Arc<dyn Backend>) -> Self {
        Self {
            root: root.to_path_buf(),
            backend,
            options: AnalyzeOptions::from_config(root, config),
            agent: config.agent.clone(),
            interval: config.envision.idle_interval(),
            ledger: None,
        }
    }

    pub fn with_ledger(mut self, ledger: UsageLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check the backlog and run envision if it is empty
    pub async fn tick(&self) -> Result<TickOutcome, EnvisionError> {
        let pending = pending_tasks(&self.root);
        if !pending.is_empty() {
            tracing::info!("{} pending task(s), skipping envision", pending.len());
            return Ok(TickOutcome::Skipped {
                pending: pending.len(),
            });
        }

        tracing::info!("Backlog empty, running envision");
        let result = analyze(Arc::clone(&self.backend), &self.options).await?;

        if let (Some(ledger), Some(usage)) = (&self.ledger, &result.usage) {
            let cost = usage
                .cost_usd
                .or_else(|| self.agent.estimate_cost(usage.total_input(), usage.output_tokens));
            ledger.record(&UsageEntry::new(
                UsageKind::Envision,
                usage.total_input(),
                usage.output_tokens,
                cost,
            ));
        }

        println!("{}", format_text(&result));
        Ok(TickOutcome::Ran {
            improvements: result.improvements.len(),
        })
    }

    /// Tick every interval until `shutdown` completes
    ///
    /// The first tick happens one full interval after start. Returns the
    /// number of completed envision runs.
    pub async fn run<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut runs = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                _ = &mut shutdown => break,
                outcome = self.tick() => outcome,
            };

            match outcome {
                Ok(TickOutcome::Ran { .. }) => runs += 1,
                Ok(TickOutcome::Skipped { .. }) => {}
                Err(e) => tracing::warn!("Envision run failed: {}", e),
            }
        }

        tracing::info!("Scheduler stopped after {} run(s)", runs);
        runs
    }
}
