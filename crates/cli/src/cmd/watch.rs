//! Watch a project and review changes as they settle

use crate::util;
use agent::{ClaudeCli, Orchestrator, SessionStats, TerminalPrompter};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vigil_core::{UsageLedger, VigilConfig};
use watcher::{ChangeTracker, IgnoreFilter, Watcher};

pub async fn run(root: &Path, debounce_ms: Option<u64>, log_file: Option<&Path>) -> Result<()> {
    // 1. Resolve the watch root; a missing directory is fatal
    let root = watcher::resolve_root(root).context("Cannot watch project")?;

    // 2. Load configuration, applying command-line overrides
    let mut config = util::load_config(&root)?;
    if let Some(ms) = debounce_ms {
        config.watch.debounce_ms = ms;
        config.validate().context("Invalid --debounce-ms")?;
    }

    // 3. Attach the watcher
    let filter = ignore_rules(&root, &config, log_file)?;
    let tracker = Arc::new(ChangeTracker::new(config.watch.debounce()));
    let mut watcher = Watcher::start(&root, Arc::new(filter), Arc::clone(&tracker))
        .context("Failed to start file watcher")?;

    // 4. Wire the analysis service
    let backend = Arc::new(ClaudeCli::from_config(&config.agent, &root));
    let mut orchestrator = Orchestrator::new(backend, Box::new(TerminalPrompter), config.agent.clone())
        .with_ledger(UsageLedger::for_root(&root))
        .with_progress(true);

    util::banner("Vigil Continuous Agent", "Semi-Auto Mode (Approval Required)");
    agent::section(&format!("Monitoring: {}", root.display().to_string().cyan()));
    println!(
        "Watching for file changes... {}\n",
        format!("(debounce {}ms, Ctrl+C to stop)", config.watch.debounce_ms).dimmed()
    );

    // 5. Monitor until interrupted
    let stats = agent::run_monitor(
        &tracker,
        &mut orchestrator,
        config.watch.poll_interval(),
        shutdown_signal(),
    )
    .await;

    watcher.stop();
    println!("\n👋 Shutting down agent...");
    print_summary(&stats);
    Ok(())
}

/// Ignore rules for a watch session
///
/// Besides the configured patterns, the state directory and the log file are
/// always excluded: both are written while monitoring and would otherwise
/// feed their own writes back into analysis.
fn ignore_rules(root: &Path, config: &VigilConfig, log_file: Option<&Path>) -> Result<IgnoreFilter> {
    let mut filter = IgnoreFilter::load(root, &config.watch.ignore_patterns, config.watch.use_gitignore)
        .context("Failed to build ignore rules")?
        .exclude(root.join(vigil_core::STATE_DIR));

    if let Some(path) = log_file.and_then(resolve_log_file) {
        tracing::debug!("Excluding log file {}", path.display());
        filter = filter.exclude(path);
    }
    Ok(filter)
}

/// Absolute form of the log file path, matching how the watcher reports paths
///
/// The directory exists once logging is initialized.
fn resolve_log_file(path: &Path) -> Option<PathBuf> {
    let file_name = path.file_name()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Some(dir.canonicalize().ok()?.join(file_name))
}

/// Completes on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_summary(stats: &SessionStats) {
    println!("\n{}", "Session Summary".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Analyses:       {}", stats.analyses);
    println!("  Issues found:   {}", stats.issues_found);
    println!("  Fixes applied:  {}", stats.fixes_applied.to_string().green());
    println!("  Fixes declined: {}", stats.fixes_declined);
    if stats.failures > 0 {
        println!("  Failures:       {}", stats.failures.to_string().yellow());
    }

    let usage = &stats.usage;
    if usage.total_input() > 0 || usage.output_tokens > 0 {
        print!("  Tokens:         {} in / {} out", usage.total_input(), usage.output_tokens);
        match usage.cost_usd {
            Some(cost) => println!(" ({})", util::format_cost(cost)),
            None => println!(),
        }
    }
}
