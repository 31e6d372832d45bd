//! List pending backlog tasks

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use vigil_core::pending_tasks;

pub fn run(root: &Path, json: bool) -> Result<()> {
    let tasks = pending_tasks(root);

    if json {
        let out = serde_json::to_string_pretty(&tasks).context("Failed to encode tasks")?;
        println!("{}", out);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("{}", "No pending tasks".dimmed());
        return Ok(());
    }

    println!("{} ({})", "Pending Tasks".bold(), tasks.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (i, task) in tasks.iter().enumerate() {
        let priority = match task.priority {
            Some(ref p) => format!("[{}]", p),
            None => "[-]".to_string(),
        };
        let kind = task.kind.as_deref().unwrap_or("task");

        println!(
            "{:>3}. {} {} {} {}",
            i + 1,
            priority.yellow(),
            kind.cyan(),
            task.title,
            format!("({})", task.source).dimmed()
        );
    }

    Ok(())
}
