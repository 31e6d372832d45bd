//! Ignore pattern management
//!
//! A path is ignored when any configured pattern:
//! 1. equals one of its path segments exactly (`venv` ignores `./venv/lib/x.py`
//!    but not `./src/venv_helper.py`), or
//! 2. glob-matches its final component (`*.pyc` ignores `mod.pyc`).
//!
//! Optionally the watch root's `.gitignore` is consulted as a second layer.
//! Paths the process itself writes to (state directory, log file) can be
//! excluded outright with [`IgnoreFilter::exclude`].
//! Matching never touches the filesystem, so paths that were just deleted are
//! classified the same as live ones.

use crate::WatchError;
use globset::{Glob, GlobMatcher};
use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Check a path against a pattern set
///
/// Pure predicate; patterns are compiled on every call. Long-running callers
/// should build an [`IgnoreFilter`] once instead.
pub fn should_ignore<S: AsRef<str>>(path: &Path, patterns: &[S]) -> bool {
    patterns.iter().any(|pattern| {
        let pattern = pattern.as_ref();
        if has_segment(path, pattern) {
            return true;
        }
        match Glob::new(pattern) {
            Ok(glob) => file_name_matches(path, &glob.compile_matcher()),
            Err(_) => false,
        }
    })
}

fn has_segment(path: &Path, pattern: &str) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name.to_str() == Some(pattern),
        _ => false,
    })
}

fn file_name_matches(path: &Path, matcher: &GlobMatcher) -> bool {
    path.file_name().map_or(false, |name| matcher.is_match(name))
}

/// Compiled ignore rules for one monitoring session
///
/// Built once at startup from the configured patterns and never mutated while
/// monitoring is active.
pub struct IgnoreFilter {
    /// Watch root, used to relativize paths for the gitignore layer
    root: PathBuf,

    /// Patterns compared against every path segment
    segments: HashSet<String>,

    /// Patterns compiled as globs against the final component
    globs: Vec<GlobMatcher>,

    /// `<root>/.gitignore` rules (optional)
    gitignore: Option<Gitignore>,

    /// Absolute paths excluded together with everything below them
    excluded: Vec<PathBuf>,
}

impl IgnoreFilter {
    /// Build a filter from configured patterns
    ///
    /// Patterns that are not valid globs still act as exact segment matches.
    pub fn new<S: AsRef<str>>(root: &Path, patterns: &[S]) -> Self {
        let mut segments = HashSet::new();
        let mut globs = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            segments.insert(pattern.to_string());

            if is_glob(pattern) {
                match Glob::new(pattern) {
                    Ok(glob) => globs.push(glob.compile_matcher()),
                    Err(e) => tracing::warn!("Ignoring invalid glob '{}': {}", pattern, e),
                }
            }
        }

        Self {
            root: root.to_path_buf(),
            segments,
            globs,
            gitignore: None,
            excluded: Vec::new(),
        }
    }

    /// Build a filter and, if requested, load `<root>/.gitignore`
    pub fn load<S: AsRef<str>>(root: &Path, patterns: &[S], use_gitignore: bool) -> Result<Self, WatchError> {
        let mut filter = Self::new(root, patterns);
        if use_gitignore {
            filter.gitignore = load_gitignore(root)?;
        }
        Ok(filter)
    }

    /// Never report `path` or anything below it
    ///
    /// Independent of the configured patterns, so user configuration cannot
    /// re-enable it.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    /// Check if path should be ignored
    pub fn should_ignore(&self, path: &Path) -> bool {
        if self.excluded.iter().any(|excluded| path.starts_with(excluded)) {
            return true;
        }

        let segment_hit = path.components().any(|component| match component {
            Component::Normal(name) => name
                .to_str()
                .map_or(false, |name| self.segments.contains(name)),
            _ => false,
        });
        if segment_hit {
            return true;
        }

        if self.globs.iter().any(|glob| file_name_matches(path, glob)) {
            return true;
        }

        if let Some(ref gitignore) = self.gitignore {
            if let Some(relative) = self.relativize(path) {
                if gitignore
                    .matched_path_or_any_parents(&relative, false)
                    .is_ignore()
                {
                    return true;
                }
            }
        }

        false
    }

    /// Number of active rule sources (patterns, gitignore)
    pub fn active_sources(&self) -> usize {
        let mut count = 0;
        if !self.segments.is_empty() {
            count += 1;
        }
        if self.gitignore.is_some() {
            count += 1;
        }
        count
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path relative to the root, or `None` for paths outside it
    fn relativize(&self, path: &Path) -> Option<PathBuf> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root).ok()?
        } else {
            path
        };

        let cleaned: PathBuf = relative
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();

        if cleaned.as_os_str().is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.chars().any(|c| matches!(c, '*' | '?' | '[' | '{'))
}

fn load_gitignore(root: &Path) -> Result<Option<Gitignore>, WatchError> {
    let gitignore_path = root.join(".gitignore");
    if !gitignore_path.exists() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(e) = builder.add(&gitignore_path) {
        tracing::warn!("Problem reading {}: {}", gitignore_path.display(), e);
    }
    Ok(Some(builder.build()?))
}
