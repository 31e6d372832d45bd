//! `vigil envision` against a stand-in analysis service

#![cfg(unix)]

use crate::common::{fake_service, write};
use crate::vigil;
use anyhow::Result;
use tempfile::TempDir;

const RESULT: &str = r#"{"type":"result","subtype":"success","is_error":false,"result":"---IMPROVEMENT---\nCATEGORY: missing_tests\nTITLE: Test the parser\nFILE: src/parse.py\nPRIORITY: high\nTIME_ESTIMATE: 8\nDESCRIPTION: No tests cover malformed input\n---END---","num_turns":4,"total_cost_usd":0.25,"usage":{"input_tokens":1000,"output_tokens":200}}"#;

fn project() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    let script = fake_service(temp_dir.path(), RESULT);
    write(
        temp_dir.path(),
        "vigil.toml",
        &format!("[agent]\ncommand = \"{}\"\n", script.display()),
    );
    write(temp_dir.path(), "src/parse.py", "def parse(s):\n    return s\n");
    write(temp_dir.path(), "venv/lib/site.py", "x = 1\n");
    Ok(temp_dir)
}

#[test]
fn test_envision_json_report_and_ledger() -> Result<()> {
    let temp_dir = project()?;

    let result = vigil!(
        temp_dir.path(),
        "envision",
        "--max-agents",
        "1",
        "--output",
        "json"
    )
    .assert_success()?;

    let report = result.json()?;
    assert_eq!(report["improvements_count"], 1);
    assert_eq!(report["improvements"][0]["title"], "Test the parser");
    assert_eq!(report["improvements"][0]["category"], "missing_tests");
    // fake-claude.sh, vigil.toml and src/parse.py; venv is ignored
    assert_eq!(report["files_in_scope"], 3);
    assert_eq!(report["usage"]["input_tokens"], 1000);

    let usage = vigil!(temp_dir.path(), "usage", "--json").assert_success()?.json()?;
    assert_eq!(usage["by_kind"]["envision"]["runs"], 1);
    assert_eq!(usage["total"]["cost_usd"], 0.25);
    Ok(())
}

#[test]
fn test_envision_parallel_text_report() -> Result<()> {
    let temp_dir = project()?;

    let result = vigil!(temp_dir.path(), "envision", "--max-agents", "4").assert_success()?;
    assert!(result.contains_stdout("CODEBASE IMPROVEMENT PROPOSALS"));
    // One query per category; each answers with the same proposal
    assert!(result.contains_stdout("Improvements found: 4"));
    assert!(result.contains_stdout("[!] 1. Test the parser"));
    assert!(result.contains_stdout("NOTE: These are proposals only"));
    Ok(())
}

#[test]
fn test_envision_category_filter() -> Result<()> {
    let temp_dir = project()?;

    let result = vigil!(
        temp_dir.path(),
        "envision",
        "--category",
        "code_quality",
        "--output",
        "json"
    )
    .assert_success()?;

    // The service answered with a missing_tests proposal only
    assert_eq!(result.json()?["improvements_count"], 0);
    Ok(())
}
