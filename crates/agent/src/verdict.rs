//! Review verdicts and prompt text

use std::path::PathBuf;

/// Words that mark an analysis as having found something to fix
const ISSUE_KEYWORDS: &[&str] = &["issue", "error", "bug", "fix", "problem", "should"];

/// Outcome of a read-only analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    NoIssues,
    IssuesFound { fix: String },
}

impl Verdict {
    /// Classify the service's free-text analysis
    pub fn classify(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Verdict::NoIssues;
        }

        let lowered = trimmed.to_lowercase();
        if ISSUE_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            Verdict::IssuesFound {
                fix: trimmed.to_string(),
            }
        } else {
            Verdict::NoIssues
        }
    }

    pub fn has_issues(&self) -> bool {
        matches!(self, Verdict::IssuesFound { .. })
    }
}

/// Render paths as an indented bullet list
pub fn file_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("  - {}", path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for the read-only analysis of freshly changed files
pub fn review_prompt(paths: &[PathBuf]) -> String {
    format!(
        "The following files were just modified:\n{}\n\n\
         Please:\n\
         1. Read these files to understand the changes\n\
         2. Check for any errors, bugs, or issues (syntax errors, logic errors, security issues, etc.)\n\
         3. If you find issues, describe them clearly and propose fixes\n\
         4. Do not modify any files\n\n\
         If everything looks good, just say so.",
        file_list(paths)
    )
}

/// Prompt for applying a previously proposed fix
pub fn apply_prompt(paths: &[PathBuf], fix: &str) -> String {
    format!(
        "Based on your previous analysis:\n{}\n\n\
         Please apply the fixes to these files:\n{}\n\n\
         Make the necessary edits to fix the issues you identified.",
        fix,
        file_list(paths)
    )
}
