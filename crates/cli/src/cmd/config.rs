//! Configuration command
//!
//! Shows the configuration in effect for a project, or an annotated example.

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use vigil_core::VigilConfig;

pub fn run(root: &Path, example: bool) -> Result<()> {
    if example {
        print!("{}", vigil_core::config::example());
        return Ok(());
    }

    let config = util::load_config(root)?;
    let path = VigilConfig::path_in(root);

    println!("{}", "Vigil Configuration".bold());
    if path.exists() {
        println!("{}: {}\n", "Location".dimmed(), path.display().dimmed());
    } else {
        println!("{}\n", format!("No {} found, showing defaults", path.display()).dimmed());
    }

    let rendered = config.to_toml().context("Failed to render configuration")?;
    println!("{}", rendered);

    println!("{}", "Valid Ranges:".bold());
    println!("  watch.debounce_ms: 50-60000");
    println!("  watch.poll_interval_ms: 10-10000");
    println!("  agent.*_timeout_secs: 1-7200");
    println!("  agent.max_turns: 1-200");
    println!("  envision.max_agents: 1-16");
    println!("  envision.max_time_secs: 10-7200");
    println!("  envision.idle_interval_secs: 60-86400");

    Ok(())
}
