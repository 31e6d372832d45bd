//! Run envision whenever the backlog is empty

use crate::cmd::watch::shutdown_signal;
use crate::util;
use agent::ClaudeCli;
use anyhow::{Context, Result};
use envision::Scheduler;
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use vigil_core::UsageLedger;

pub async fn run(root: &Path) -> Result<()> {
    let root = watcher::resolve_root(root).context("Cannot schedule project")?;
    let config = util::load_config(&root)?;

    let backend = Arc::new(ClaudeCli::from_config(&config.agent, &root));
    let scheduler = Scheduler::new(&root, &config, backend).with_ledger(UsageLedger::for_root(&root));

    util::banner("ENVISION SCHEDULER", "Idle-Time Improvement Proposals");
    println!(
        "\nChecking the backlog of {} every {} {}",
        root.display().to_string().cyan(),
        humanize_secs(scheduler.interval().as_secs()),
        "(Ctrl+C to stop)".dimmed()
    );

    let runs = scheduler.run(shutdown_signal()).await;
    println!("\nScheduler stopped after {} run(s)", runs);
    Ok(())
}

fn humanize_secs(secs: u64) -> String {
    if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
