//! Codebase analysis runs

use crate::improvement::{build_prompt, parse_improvements, Category, CategoryFilter, Improvement};
use crate::EnvisionError;
use agent::{Backend, Query, Usage};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use vigil_core::VigilConfig;
use walkdir::WalkDir;
use watcher::IgnoreFilter;

/// Parameters for one analysis run
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub root: PathBuf,
    /// Upper bound on concurrent service queries
    pub max_agents: usize,
    /// Overall time limit for the run
    pub max_time: Duration,
    pub filter: CategoryFilter,
    pub max_turns: u32,
    pub ignore_patterns: Vec<String>,
    pub use_gitignore: bool,
}

impl AnalyzeOptions {
    /// Options for `root` taken from the session configuration
    pub fn from_config(root: &Path, config: &VigilConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            max_agents: config.envision.max_agents,
            max_time: config.envision.max_time(),
            filter: CategoryFilter::All,
            max_turns: config.agent.max_turns,
            ignore_patterns: config.watch.ignore_patterns.clone(),
            use_gitignore: config.watch.use_gitignore,
        }
    }

    /// Category groups, one service query per group
    fn batches(&self) -> Vec<Vec<Category>> {
        match self.filter {
            CategoryFilter::All if self.max_agents > 1 => Category::ALL.iter().map(|c| vec![*c]).collect(),
            filter => vec![filter.categories()],
        }
    }
}

/// Outcome of an analysis run
#[derive(Debug, Clone, Serialize)]
pub struct EnvisionResult {
    pub improvements: Vec<Improvement>,
    pub analysis_time_seconds: f64,
    /// Non-ignored files under the root
    pub files_in_scope: usize,
    pub usage: Option<Usage>,
}

/// Ask the service for improvement proposals
///
/// With `max_agents > 1` and no category restriction every category gets its
/// own query and up to `max_agents` run at once. A failed query is logged and
/// skipped unless every query failed.
pub async fn analyze(backend: Arc<dyn Backend>, options: &AnalyzeOptions) -> Result<EnvisionResult, EnvisionError> {
    let started = Instant::now();

    let filter = IgnoreFilter::load(&options.root, &options.ignore_patterns, options.use_gitignore)?;
    let files_in_scope = count_files(&options.root, &filter);

    let batches = options.batches();
    tracing::info!(
        "Envision: {} quer{} over {} file(s), max {} in flight",
        batches.len(),
        if batches.len() == 1 { "y" } else { "ies" },
        files_in_scope,
        options.max_agents
    );

    let max_turns = options.max_turns;
    let queries = stream::iter(batches)
        .map(|categories| {
            let backend = Arc::clone(&backend);
            async move {
                let query = Query::read_only(build_prompt(&categories), max_turns);
                (categories, backend.query(&query).await)
            }
        })
        .buffer_unordered(options.max_agents.max(1))
        .collect::<Vec<_>>();

    let results = tokio::time::timeout(options.max_time, queries)
        .await
        .map_err(|_| EnvisionError::TimedOut(options.max_time))?;

    let mut improvements = Vec::new();
    let mut usage: Option<Usage> = None;
    let mut first_error = None;
    let mut succeeded = 0;

    for (categories, result) in results {
        match result {
            Ok(reply) => {
                succeeded += 1;
                if let Some(ref reply_usage) = reply.usage {
                    usage.get_or_insert_with(Usage::default).merge(reply_usage);
                }
                improvements.extend(parse_improvements(&reply.text));
            }
            Err(e) => {
                let labels: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
                tracing::warn!("Envision query for {} failed: {}", labels.join(","), e);
                first_error.get_or_insert(e);
            }
        }
    }

    if succeeded == 0 {
        if let Some(e) = first_error {
            return Err(e.into());
        }
    }

    improvements.retain(|imp| options.filter.matches(&imp.category));
    improvements.sort_by_key(Improvement::priority_rank);

    let elapsed = started.elapsed().as_secs_f64();
    Ok(EnvisionResult {
        improvements,
        analysis_time_seconds: (elapsed * 100.0).round() / 100.0,
        files_in_scope,
        usage,
    })
}

/// Count non-ignored regular files under `root`
pub fn count_files(root: &Path, filter: &IgnoreFilter) -> usize {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            !filter.should_ignore(relative)
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}
