//! Pending task detection from markdown backlog files
//!
//! Scans `TODO.md`, `PLAN.md` and `CLAUDE.md` in a project directory. The
//! scheduler only asks for improvement proposals when all three are empty of
//! actionable work.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Backlog file names, in scan order
pub const TODO_FILE: &str = "TODO.md";
pub const PLAN_FILE: &str = "PLAN.md";
pub const CLAUDE_FILE: &str = "CLAUDE.md";

const IN_PROGRESS_PLACEHOLDER: &str = "_No tasks currently in progress_";

static HEADER_TASK_RE: OnceLock<Option<Regex>> = OnceLock::new();
static UNCHECKED_RE: OnceLock<Option<Regex>> = OnceLock::new();
static TODO_LINE_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// `### [HIGH] @feature - Title`
fn header_task_re() -> Option<&'static Regex> {
    HEADER_TASK_RE
        .get_or_init(|| Regex::new(r"^###\s+\[(\w+)\]\s+(@\w+)\s+-\s+(.+)$").ok())
        .as_ref()
}

/// `- [ ] Task description`
fn unchecked_re() -> Option<&'static Regex> {
    UNCHECKED_RE
        .get_or_init(|| Regex::new(r"^-\s+\[\s*\]\s+(.+)$").ok())
        .as_ref()
}

/// `TODO: Action item`
fn todo_line_re() -> Option<&'static Regex> {
    TODO_LINE_RE
        .get_or_init(|| Regex::new(r"(?i)^TODO:\s+(.+)$").ok())
        .as_ref()
}

/// Task priority as written in the backlog (upper-cased)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Priority(String);

impl Priority {
    pub fn new(label: &str) -> Self {
        Self(label.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sort rank: HIGH, MED, LOW, then anything else
    pub fn rank(&self) -> u8 {
        match self.0.as_str() {
            "HIGH" => 0,
            "MED" => 1,
            "LOW" => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single actionable item found in a backlog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// File the task came from (e.g. "TODO.md")
    pub source: String,
    pub title: String,
    pub priority: Option<Priority>,
    /// Task type tag such as "@feature"
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Task {
    fn plain(source: &str, title: &str) -> Self {
        Self {
            source: source.to_string(),
            title: title.to_string(),
            priority: None,
            kind: None,
        }
    }

    fn rank(&self) -> u8 {
        self.priority.as_ref().map_or(3, Priority::rank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    InProgress,
    Backlog,
    Completed,
    Other,
}

/// Read a backlog file; missing or unreadable files count as empty
fn read_backlog(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::debug!("Skipping unreadable {}: {}", path.display(), e);
            None
        }
    }
}

fn header_task(source: &str, line: &str) -> Option<Task> {
    let caps = header_task_re()?.captures(line)?;
    Some(Task {
        source: source.to_string(),
        title: caps[3].trim().to_string(),
        priority: Some(Priority::new(&caps[1])),
        kind: Some(caps[2].to_string()),
    })
}

/// Parse TODO.md for work in the "In Progress" and "Backlog" sections
///
/// Backlog items are headers of the form `### [PRIORITY] @type - Title`.
/// The In Progress section additionally accepts plain `### Title` headers.
/// Everything under "Completed" is ignored.
pub fn parse_todo(path: &Path) -> Vec<Task> {
    let Some(contents) = read_backlog(path) else {
        return Vec::new();
    };

    let mut tasks = Vec::new();
    let mut section: Option<Section> = None;

    for line in contents.lines() {
        let stripped = line.trim();

        if let Some(name) = stripped.strip_prefix("## ") {
            section = Some(match name.trim() {
                "In Progress" => Section::InProgress,
                "Backlog" => Section::Backlog,
                "Completed" => Section::Completed,
                _ => Section::Other,
            });
            continue;
        }

        match section {
            Some(Section::Backlog) => {
                if let Some(task) = header_task(TODO_FILE, stripped) {
                    tasks.push(task);
                }
            }
            Some(Section::InProgress) => {
                if stripped.contains(IN_PROGRESS_PLACEHOLDER) {
                    continue;
                }

                if let Some(task) = header_task(TODO_FILE, stripped) {
                    tasks.push(task);
                    continue;
                }

                if let Some(title) = stripped.strip_prefix("### ") {
                    if !stripped.starts_with("### [") {
                        let title = title.trim();
                        if !title.is_empty() {
                            tasks.push(Task::plain(TODO_FILE, title));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    tasks
}

/// Parse PLAN.md for unchecked `- [ ]` items in any section
pub fn parse_plan(path: &Path) -> Vec<Task> {
    let Some(contents) = read_backlog(path) else {
        return Vec::new();
    };
    let Some(unchecked) = unchecked_re() else {
        return Vec::new();
    };

    contents
        .lines()
        .filter_map(|line| unchecked.captures(line.trim()))
        .map(|caps| Task::plain(PLAN_FILE, caps[1].trim()))
        .collect()
}

/// Parse CLAUDE.md for explicit action items
///
/// CLAUDE.md is mostly project context; only unchecked items and `TODO:`
/// lines count.
pub fn parse_claude(path: &Path) -> Vec<Task> {
    let Some(contents) = read_backlog(path) else {
        return Vec::new();
    };
    let (Some(unchecked), Some(todo)) = (unchecked_re(), todo_line_re()) else {
        return Vec::new();
    };

    let mut tasks = Vec::new();
    for line in contents.lines() {
        let stripped = line.trim();

        if let Some(caps) = unchecked.captures(stripped) {
            tasks.push(Task::plain(CLAUDE_FILE, caps[1].trim()));
        } else if let Some(caps) = todo.captures(stripped) {
            tasks.push(Task::plain(CLAUDE_FILE, caps[1].trim()));
        }
    }

    tasks
}

/// All pending tasks in `dir`, sorted HIGH > MED > LOW > unprioritized
///
/// The sort is stable, so tasks of equal rank keep file order.
pub fn pending_tasks(dir: &Path) -> Vec<Task> {
    let mut tasks = parse_todo(&dir.join(TODO_FILE));
    tasks.extend(parse_plan(&dir.join(PLAN_FILE)));
    tasks.extend(parse_claude(&dir.join(CLAUDE_FILE)));

    tasks.sort_by_key(Task::rank);
    tasks
}

/// Whether any backlog file in `dir` has pending work
pub fn has_pending_tasks(dir: &Path) -> bool {
    !pending_tasks(dir).is_empty()
}
