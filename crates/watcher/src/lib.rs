//! File system watching for Vigil
//!
//! This crate provides:
//! - Ignore filtering (path segments, file-name globs, optional .gitignore)
//! - Per-path debouncing of change bursts
//! - A recursive OS watcher that feeds the debouncer

pub mod debounce;
pub mod ignore;

pub use debounce::ChangeTracker;
pub use ignore::{should_ignore, IgnoreFilter};

use notify::event::ModifyKind;
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

/// Errors raised while setting up a watch
///
/// All of these are fatal at startup: without a valid watch target there is
/// nothing to monitor.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch directory {path} is not accessible: {source}")]
    RootMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watch target {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to attach file watcher: {0}")]
    Attach(#[from] notify::Error),

    #[error("failed to load ignore rules: {0}")]
    Ignore(#[from] ::ignore::Error),
}

/// Resolve and validate a watch root
pub fn resolve_root(path: &Path) -> Result<PathBuf, WatchError> {
    let root = path.canonicalize().map_err(|source| WatchError::RootMissing {
        path: path.to_path_buf(),
        source,
    })?;
    if !root.is_dir() {
        return Err(WatchError::NotADirectory(root));
    }
    Ok(root)
}

/// Recursive file system watcher
///
/// Every create/modify notification for a non-ignored file is recorded in the
/// shared [`ChangeTracker`]. Nothing else happens on the notification thread.
pub struct Watcher {
    root: PathBuf,
    inner: Option<RecommendedWatcher>,
}

impl Watcher {
    /// Start watching `root` recursively
    pub fn start(root: &Path, filter: Arc<IgnoreFilter>, tracker: Arc<ChangeTracker>) -> Result<Self, WatchError> {
        let root = resolve_root(root)?;

        let mut inner = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                route_event(&event, &filter, &tracker, Instant::now());
            }
            Err(e) => tracing::warn!("Watch error: {}", e),
        })?;
        inner.watch(&root, RecursiveMode::Recursive)?;

        tracing::info!("File watcher started for {}", root.display());
        Ok(Self {
            root,
            inner: Some(inner),
        })
    }

    /// Stop watching and release the OS handle
    pub fn stop(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            if let Err(e) = inner.unwatch(&self.root) {
                tracing::debug!("Unwatch failed: {}", e);
            }
            tracing::info!("File watcher stopped");
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_some()
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File created
    Create,
    /// File contents modified
    Modify,
    /// File deleted
    Delete,
    /// File renamed
    Rename,
}

impl EventKind {
    /// Classify a raw notification; access and metadata-only events are dropped
    pub fn classify(kind: &notify::EventKind) -> Option<Self> {
        match kind {
            notify::EventKind::Create(_) => Some(EventKind::Create),
            notify::EventKind::Modify(ModifyKind::Name(_)) => Some(EventKind::Rename),
            notify::EventKind::Modify(ModifyKind::Metadata(_)) => None,
            notify::EventKind::Modify(_) => Some(EventKind::Modify),
            notify::EventKind::Remove(_) => Some(EventKind::Delete),
            _ => None,
        }
    }

    /// Whether this kind of change should trigger analysis
    pub fn triggers_analysis(&self) -> bool {
        matches!(self, EventKind::Create | EventKind::Modify)
    }
}

/// Forward one notification to the tracker
///
/// Returns the number of paths recorded. Ignored paths, directories and
/// rename/delete events are dropped silently.
pub fn route_event(event: &notify::Event, filter: &IgnoreFilter, tracker: &ChangeTracker, now: Instant) -> usize {
    let Some(kind) = EventKind::classify(&event.kind) else {
        return 0;
    };
    if !kind.triggers_analysis() {
        return 0;
    }

    let mut recorded = 0;
    for path in &event.paths {
        if path.is_dir() || filter.should_ignore(path) {
            continue;
        }
        tracing::debug!("File change: {} ({:?})", path.display(), kind);
        tracker.record(path.clone(), now);
        recorded += 1;
    }
    recorded
}
