//! Show recorded token usage

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use vigil_core::{UsageLedger, UsageTotals};

pub fn run(root: &Path, json: bool) -> Result<()> {
    let ledger = UsageLedger::for_root(root);
    let summary = ledger.summary().context("Failed to read usage ledger")?;

    if json {
        let out = serde_json::to_string_pretty(&summary).context("Failed to encode usage")?;
        println!("{}", out);
        return Ok(());
    }

    println!("{}", "Token Usage".bold());
    println!("{}: {}\n", "Ledger".dimmed(), ledger.path().display().dimmed());

    if summary.total.runs == 0 {
        println!("{}", "No usage recorded yet".dimmed());
        return Ok(());
    }

    for (kind, totals) in &summary.by_kind {
        print_totals(kind.as_str(), totals);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print_totals("total", &summary.total);

    if summary.total.uncosted_runs > 0 {
        println!(
            "\n{}",
            format!(
                "{} run(s) had no cost information; set agent prices in vigil.toml to estimate",
                summary.total.uncosted_runs
            )
            .dimmed()
        );
    }
    if summary.skipped_lines > 0 {
        println!(
            "{}",
            format!("{} malformed ledger line(s) skipped", summary.skipped_lines).yellow()
        );
    }

    Ok(())
}

fn print_totals(label: &str, totals: &UsageTotals) {
    println!(
        "  {:<10} {:>5} run(s)  {:>10} in  {:>10} out  {}",
        label.cyan(),
        totals.runs,
        totals.input_tokens,
        totals.output_tokens,
        util::format_cost(totals.cost_usd)
    );
}
