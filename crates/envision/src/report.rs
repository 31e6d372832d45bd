//! Report rendering

use crate::analyze::EnvisionResult;
use serde_json::json;

fn rule(c: char) -> String {
    std::iter::repeat(c).take(60).collect()
}

fn priority_icon(priority: &str) -> &'static str {
    match priority {
        "high" => "[!]",
        "low" => "[-]",
        _ => "[*]",
    }
}

/// `documentation_gaps` -> `Documentation Gaps`
fn title_case(label: &str) -> String {
    label
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human-readable report
pub fn format_text(result: &EnvisionResult) -> String {
    let mut lines = vec![
        String::new(),
        rule('='),
        "  CODEBASE IMPROVEMENT PROPOSALS".to_string(),
        rule('='),
        String::new(),
        format!("Analysis completed in {:.1}s", result.analysis_time_seconds),
        format!("Files in scope: {}", result.files_in_scope),
        format!("Improvements found: {}", result.improvements.len()),
    ];

    if let Some(ref usage) = result.usage {
        let mut line = format!(
            "Tokens: {} in / {} out",
            usage.total_input(),
            usage.output_tokens
        );
        if let Some(cost) = usage.cost_usd {
            line.push_str(&format!(" (${:.4})", cost));
        }
        lines.push(line);
    }
    lines.push(String::new());

    if result.improvements.is_empty() {
        lines.push("No improvements identified. The codebase looks good!".to_string());
    } else {
        for (i, imp) in result.improvements.iter().enumerate() {
            lines.push(rule('-'));
            lines.push(format!("{} {}. {}", priority_icon(&imp.priority), i + 1, imp.title));
            lines.push(format!("   Category: {}", title_case(&imp.category)));
            lines.push(format!("   Priority: {}", imp.priority.to_uppercase()));
            lines.push(format!("   Estimated time: ~{} min", imp.estimated_time_minutes));
            if let Some(ref file) = imp.file_path {
                lines.push(format!("   File: {}", file));
            }
            lines.push(String::new());
            lines.push(format!("   {}", imp.description));
            lines.push(String::new());
        }
    }

    lines.push(rule('='));
    lines.push("NOTE: These are proposals only. No changes have been made.".to_string());
    lines.push(rule('='));
    lines.push(String::new());

    lines.join("\n")
}

/// Machine-readable report
pub fn format_json(result: &EnvisionResult) -> Result<String, serde_json::Error> {
    let value = json!({
        "analysis_time_seconds": result.analysis_time_seconds,
        "files_in_scope": result.files_in_scope,
        "improvements_count": result.improvements.len(),
        "improvements": result.improvements,
        "usage": result.usage,
    });
    serde_json::to_string_pretty(&value)
}
