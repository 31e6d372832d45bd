//! Analysis and apply orchestration
//!
//! A flushed path set goes through two stages:
//! 1. read-only review, whose text is shown to the operator
//! 2. write-enabled apply, only after the operator approves the proposal

use crate::backend::{Backend, BackendError, Query, Reply, Usage};
use crate::verdict::{apply_prompt, review_prompt, Verdict};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vigil_core::{AgentConfig, UsageEntry, UsageKind, UsageLedger};

/// Question shown before any write-enabled call
pub const APPROVAL_QUESTION: &str = "Apply this fix?";

/// Asks the operator a yes/no question
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Returns true only for an explicit affirmative answer
    async fn confirm(&self, question: &str) -> bool;
}

/// Prompter reading one line from stdin
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, question: &str) -> bool {
        let question = question.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            print!("\n{} [y/n]: ", question);
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok::<_, std::io::Error>(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            Ok(Err(e)) => {
                tracing::warn!("Could not read approval: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!("Approval prompt task failed: {}", e);
                false
            }
        }
    }
}

/// Only `y` or `yes` approves; anything else, including empty input, refuses
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_ascii_lowercase();
    answer == "y" || answer == "yes"
}

/// Result of a review stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Review {
    /// Nothing to fix
    Clean,
    /// Issues reported but the operator refused the fix
    Declined,
    /// Operator approved applying this fix
    Approved { fix: String },
}

/// Counters for one monitoring session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub analyses: u64,
    pub issues_found: u64,
    pub fixes_applied: u64,
    pub fixes_declined: u64,
    pub failures: u64,
    pub usage: Usage,
}

/// Drives the analysis service for flushed change sets
pub struct Orchestrator {
    backend: Arc<dyn Backend>,
    prompter: Box<dyn Prompter>,
    config: AgentConfig,
    ledger: Option<UsageLedger>,
    progress: bool,
    stats: SessionStats,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn Backend>, prompter: Box<dyn Prompter>, config: AgentConfig) -> Self {
        Self {
            backend,
            prompter,
            config,
            ledger: None,
            progress: false,
            stats: SessionStats::default(),
        }
    }

    /// Record token usage of every call in `ledger`
    pub fn with_ledger(mut self, ledger: UsageLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Show a spinner while waiting on the service
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn into_stats(self) -> SessionStats {
        self.stats
    }

    /// Run a read-only analysis of `paths` and ask for approval if needed
    pub async fn review(&mut self, paths: &[PathBuf]) -> Result<Review, BackendError> {
        self.stats.analyses += 1;
        tracing::info!("Analyzing {} changed file(s)", paths.len());

        section("Analyzing changes...");
        let query = Query::read_only(review_prompt(paths), self.config.max_turns);
        let reply = self
            .call(&query, self.config.analysis_timeout(), "Waiting for analysis")
            .await?;
        self.record_usage(UsageKind::Review, &reply);

        println!("\n{}", reply.text);

        match Verdict::classify(&reply.text) {
            Verdict::NoIssues => {
                println!("{} No issues found, continuing to monitor...", "✓".green());
                Ok(Review::Clean)
            }
            Verdict::IssuesFound { fix } => {
                self.stats.issues_found += 1;
                if self.prompter.confirm(APPROVAL_QUESTION).await {
                    Ok(Review::Approved { fix })
                } else {
                    self.stats.fixes_declined += 1;
                    println!("{} Skipping fixes, continuing to monitor...", "✓".green());
                    Ok(Review::Declined)
                }
            }
        }
    }

    /// Apply a previously approved fix with write access
    pub async fn apply(&mut self, paths: &[PathBuf], fix: &str) -> Result<Reply, BackendError> {
        tracing::info!("Applying approved fix to {} file(s)", paths.len());

        section("Applying fixes...");
        let query = Query::write_enabled(apply_prompt(paths, fix), self.config.max_turns);
        let reply = self
            .call(&query, self.config.apply_timeout(), "Applying fix")
            .await?;
        self.record_usage(UsageKind::Apply, &reply);
        self.stats.fixes_applied += 1;

        if !reply.text.trim().is_empty() {
            println!("\n{}", reply.text);
        }
        println!("\n{} Fixes applied!", "✓".green());
        Ok(reply)
    }

    /// Count and surface a contained failure
    pub fn report_failure(&mut self, error: &BackendError) {
        self.stats.failures += 1;
        tracing::warn!("Analysis failed: {}", error);
        println!(
            "{} Analysis failed ({}), continuing to monitor...",
            "!".yellow(),
            error
        );
    }

    async fn call(&self, query: &Query, limit: Duration, message: &'static str) -> Result<Reply, BackendError> {
        let spinner = self.spinner(message);
        let result = tokio::time::timeout(limit, self.backend.query(query)).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => reply,
            Err(_) => Err(BackendError::Timeout(limit)),
        }
    }

    fn spinner(&self, message: &'static str) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    fn record_usage(&mut self, kind: UsageKind, reply: &Reply) {
        let Some(ref usage) = reply.usage else {
            return;
        };
        self.stats.usage.merge(usage);

        if let Some(ref ledger) = self.ledger {
            let cost = usage
                .cost_usd
                .or_else(|| self.config.estimate_cost(usage.total_input(), usage.output_tokens));
            ledger.record(&UsageEntry::new(kind, usage.total_input(), usage.output_tokens, cost));
        }
    }
}

/// Print a horizontal section header
pub fn section(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{}", rule.dimmed());
    println!("{}", title.bold());
    println!("{}", rule.dimmed());
}
