//! Vigil CLI - vigil command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

mod cmd;
mod util;

/// Grace period for blocking tasks (such as a pending approval prompt) at exit
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Vigil - watches your project and proposes fixes as you edit
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch for changes and review them as they settle
    Watch {
        /// Quiet period before a changed file is analyzed, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Propose small codebase improvements (read-only)
    Envision {
        /// Maximum number of parallel analysis queries
        #[arg(long)]
        max_agents: Option<usize>,
        /// Maximum time for the analysis, in seconds
        #[arg(long)]
        max_time: Option<u64>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
        /// Category to analyze (code_quality, missing_tests,
        /// documentation_gaps, potential_bugs or all)
        #[arg(long, default_value = "all")]
        category: String,
    },
    /// List pending tasks from TODO.md, PLAN.md and CLAUDE.md
    Tasks {
        /// Print tasks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run envision whenever the backlog is empty
    Schedule,
    /// Show recorded token usage and cost
    Usage {
        /// Print totals as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Print a commented example vigil.toml instead
        #[arg(long)]
        example: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = util::init_logging(cli.verbose, cli.log_file.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(dispatch(cli));
    // A blocked stdin read must not keep the process alive
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn dispatch(cli: Cli) -> Result<()> {
    let root = util::project_root(cli.root.as_deref())?;

    match cli.command {
        Commands::Watch { debounce_ms } => cmd::watch::run(&root, debounce_ms, cli.log_file.as_deref()).await,
        Commands::Envision {
            max_agents,
            max_time,
            output,
            category,
        } => cmd::envision::run(&root, max_agents, max_time, output, &category).await,
        Commands::Tasks { json } => cmd::tasks::run(&root, json),
        Commands::Schedule => cmd::schedule::run(&root).await,
        Commands::Usage { json } => cmd::usage::run(&root, json),
        Commands::Config { example } => cmd::config::run(&root, example),
    }
}
