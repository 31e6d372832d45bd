//! Improvement proposals
//!
//! The service is asked to answer in delimited blocks:
//!
//! ```text
//! ---IMPROVEMENT---
//! CATEGORY: code_quality
//! TITLE: Extract helper
//! FILE: src/app.py
//! PRIORITY: high
//! TIME_ESTIMATE: 5
//! DESCRIPTION: ...
//! ---END---
//! ```
//!
//! Field values may span several lines; a value runs until the next field tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const BLOCK_START: &str = "---IMPROVEMENT---";
const BLOCK_END: &str = "---END---";

/// Upper bound on a single proposal's estimated effort, in minutes
pub const MAX_MINUTES: u32 = 10;

/// Kind of improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CodeQuality,
    MissingTests,
    DocumentationGaps,
    PotentialBugs,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::CodeQuality,
        Category::MissingTests,
        Category::DocumentationGaps,
        Category::PotentialBugs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CodeQuality => "code_quality",
            Category::MissingTests => "missing_tests",
            Category::DocumentationGaps => "documentation_gaps",
            Category::PotentialBugs => "potential_bugs",
        }
    }

    fn focus(&self) -> &'static str {
        match self {
            Category::CodeQuality => "**Code Quality**: Refactoring opportunities, code smells, complexity issues",
            Category::MissingTests => "**Missing Tests**: Functions/modules without adequate test coverage",
            Category::DocumentationGaps => "**Documentation Gaps**: Missing docstrings, unclear code, outdated comments",
            Category::PotentialBugs => "**Potential Bugs**: Error handling issues, edge cases, security concerns",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Which categories a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn categories(&self) -> Vec<Category> {
        match self {
            CategoryFilter::All => Category::ALL.to_vec(),
            CategoryFilter::Only(c) => vec![*c],
        }
    }

    /// Whether a parsed category label passes the filter
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c.as_str() == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => c.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

/// One proposed improvement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    /// Category label as reported (normalized to snake_case)
    pub category: String,
    pub title: String,
    pub description: String,
    pub file_path: Option<String>,
    pub estimated_time_minutes: u32,
    /// `high`, `medium` or `low`; other labels are kept verbatim
    pub priority: String,
}

impl Improvement {
    /// Sort key: high first, unknown labels rank with medium
    pub fn priority_rank(&self) -> u8 {
        match self.priority.as_str() {
            "high" => 0,
            "low" => 2,
            _ => 1,
        }
    }
}

/// Prompt asking for improvements in the given categories
pub fn build_prompt(categories: &[Category]) -> String {
    let mut focus = String::new();
    for (i, category) in categories.iter().enumerate() {
        focus.push_str(&format!("{}. {}\n", i + 1, category.focus()));
    }

    let labels: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();

    format!(
        "You are a code improvement analyst. Analyze this codebase to find opportunities for improvement.\n\n\
         IMPORTANT: This is a READ-ONLY analysis. DO NOT make any changes. Only identify and report improvements.\n\n\
         Focus on these categories:\n{focus}\n\
         For each improvement you identify:\n\
         - Keep it small and focused (max {max} minutes of work)\n\
         - Be specific about the file and location\n\
         - Explain WHY it's an improvement\n\
         - Estimate time to implement\n\n\
         Start by exploring the codebase structure using Glob, then Read key files to understand the code.\n\n\
         Output your findings in this exact format (one improvement per block):\n\n\
         {start}\n\
         CATEGORY: <one of: {labels}>\n\
         TITLE: <short descriptive title>\n\
         FILE: <file path or \"N/A\" if general>\n\
         PRIORITY: <low, medium, or high>\n\
         TIME_ESTIMATE: <number of minutes>\n\
         DESCRIPTION: <detailed description of the improvement>\n\
         {end}\n\n\
         Find 3-5 high-value improvements. Focus on practical, actionable items.",
        focus = focus,
        max = MAX_MINUTES,
        start = BLOCK_START,
        end = BLOCK_END,
        labels = labels.join(", "),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Category,
    Title,
    File,
    Priority,
    TimeEstimate,
    Description,
}

impl Field {
    const TAGS: [(&'static str, Field); 6] = [
        ("CATEGORY:", Field::Category),
        ("TITLE:", Field::Title),
        ("FILE:", Field::File),
        ("PRIORITY:", Field::Priority),
        ("TIME_ESTIMATE:", Field::TimeEstimate),
        ("DESCRIPTION:", Field::Description),
    ];

    /// Split a line into its field tag and the rest of the value
    fn parse(line: &str) -> Option<(Field, &str)> {
        Self::TAGS
            .iter()
            .find_map(|(tag, field)| line.strip_prefix(tag).map(|rest| (*field, rest.trim())))
    }
}

#[derive(Default)]
struct Fields {
    category: Option<String>,
    title: Option<String>,
    file: Option<String>,
    priority: Option<String>,
    time_estimate: Option<String>,
    description: Option<String>,
}

impl Fields {
    fn set(&mut self, field: Field, lines: &[&str]) {
        let value = Some(lines.join("\n").trim().to_string());
        match field {
            Field::Category => self.category = value,
            Field::Title => self.title = value,
            Field::File => self.file = value,
            Field::Priority => self.priority = value,
            Field::TimeEstimate => self.time_estimate = value,
            Field::Description => self.description = value,
        }
    }

    fn into_improvement(self) -> Option<Improvement> {
        let category = self.category?;
        let title = self.title?;
        let description = self.description?;

        let minutes = self
            .time_estimate
            .map(|raw| raw.chars().filter(char::is_ascii_digit).collect::<String>())
            .and_then(|digits| digits.parse::<u32>().ok())
            .unwrap_or(MAX_MINUTES);

        let file_path = self.file.filter(|f| !f.eq_ignore_ascii_case("n/a"));

        Some(Improvement {
            category: category.to_lowercase().replace(' ', "_"),
            title,
            description,
            file_path,
            estimated_time_minutes: minutes.min(MAX_MINUTES),
            priority: self
                .priority
                .map(|p| p.to_lowercase())
                .unwrap_or_else(|| "medium".to_string()),
        })
    }
}

/// Extract every complete improvement block from a response
///
/// Blocks without an end marker, or missing a category, title or
/// description, are skipped.
pub fn parse_improvements(text: &str) -> Vec<Improvement> {
    text.split(BLOCK_START)
        .skip(1)
        .filter_map(|block| {
            let (content, _) = block.split_once(BLOCK_END)?;
            parse_block(content.trim())
        })
        .collect()
}

fn parse_block(content: &str) -> Option<Improvement> {
    let mut fields = Fields::default();
    let mut current: Option<(Field, Vec<&str>)> = None;

    for line in content.lines() {
        match Field::parse(line) {
            Some((field, rest)) => {
                if let Some((prev, lines)) = current.take() {
                    fields.set(prev, &lines);
                }
                current = Some((field, vec![rest]));
            }
            None => {
                if let Some((_, ref mut lines)) = current {
                    lines.push(line);
                }
            }
        }
    }
    if let Some((field, lines)) = current {
        fields.set(field, &lines);
    }

    fields.into_improvement()
}
