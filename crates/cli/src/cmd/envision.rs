//! Propose codebase improvements

use crate::util;
use crate::OutputFormat;
use agent::ClaudeCli;
use anyhow::{Context, Result};
use ::envision::{AnalyzeOptions, CategoryFilter};
use std::path::Path;
use std::sync::Arc;
use vigil_core::{UsageEntry, UsageKind, UsageLedger};

pub async fn run(
    root: &Path,
    max_agents: Option<usize>,
    max_time: Option<u64>,
    output: OutputFormat,
    category: &str,
) -> Result<()> {
    let root = watcher::resolve_root(root).context("Cannot analyze project")?;

    let mut config = util::load_config(&root)?;
    if let Some(n) = max_agents {
        config.envision.max_agents = n;
    }
    if let Some(secs) = max_time {
        config.envision.max_time_secs = secs;
    }
    config.validate().context("Invalid envision options")?;

    let filter: CategoryFilter = category.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut options = AnalyzeOptions::from_config(&root, &config);
    options.filter = filter;

    // Keep stdout clean for JSON consumers
    if output == OutputFormat::Text {
        util::banner("ENVISION", "Codebase Improvement Analyzer");
        println!("\nAnalyzing codebase: {}", root.display());
        println!("Max agents: {}", options.max_agents);
        println!("Max time: {}s", options.max_time.as_secs());
        println!("Category: {}", options.filter);
        println!("\nStarting analysis (this may take a few minutes)...\n");
    }

    let backend = Arc::new(ClaudeCli::from_config(&config.agent, &root));
    let result = ::envision::analyze(backend, &options)
        .await
        .context("Envision analysis failed")?;

    if let Some(ref usage) = result.usage {
        let cost = usage
            .cost_usd
            .or_else(|| config.agent.estimate_cost(usage.total_input(), usage.output_tokens));
        UsageLedger::for_root(&root).record(&UsageEntry::new(
            UsageKind::Envision,
            usage.total_input(),
            usage.output_tokens,
            cost,
        ));
    }

    match output {
        OutputFormat::Text => println!("{}", ::envision::format_text(&result)),
        OutputFormat::Json => println!(
            "{}",
            ::envision::format_json(&result).context("Failed to encode report")?
        ),
    }

    tracing::debug!("Envision finished in {:.2}s", result.analysis_time_seconds);
    Ok(())
}
