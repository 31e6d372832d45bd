//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use vigil_core::VigilConfig;

/// Install the global tracing subscriber
///
/// Logs go to stderr, or through a non-blocking writer to `log_file`. The
/// returned guard flushes the file writer and must live until exit.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
            Ok(None)
        }
    }
}

/// Resolve the project root (explicit `--root` or the current directory)
pub fn project_root(root: Option<&Path>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root.to_path_buf()),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

/// Load and validate `vigil.toml` under `root`
pub fn load_config(root: &Path) -> Result<VigilConfig> {
    let config = VigilConfig::load(root)
        .with_context(|| format!("Failed to load configuration from {}", root.display()))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Print a boxed banner
pub fn banner(title: &str, subtitle: &str) {
    let width = 59;
    println!();
    println!("╔{}╗", "═".repeat(width));
    println!("║  {:<w$}║", title.bold(), w = width - 2);
    println!("║  {:<w$}║", subtitle, w = width - 2);
    println!("╚{}╝", "═".repeat(width));
}

/// Format a USD amount
pub fn format_cost(cost: f64) -> String {
    if cost < 0.01 && cost > 0.0 {
        format!("${:.4}", cost)
    } else {
        format!("${:.2}", cost)
    }
}
