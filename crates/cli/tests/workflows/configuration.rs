//! `vigil config` and `vigil usage`

use crate::common::write;
use crate::vigil;
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_config_example_is_valid_toml() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let result = vigil!(temp_dir.path(), "config", "--example").assert_success()?;
    assert!(result.contains_stdout("[watch]"));
    assert!(result.contains_stdout("debounce_ms = 2000"));

    // The example doubles as a working config file
    write(temp_dir.path(), "vigil.toml", &result.stdout);
    let result = vigil!(temp_dir.path(), "config").assert_success()?;
    assert!(result.contains_stdout("Location"));
    Ok(())
}

#[test]
fn test_config_defaults_without_file() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let result = vigil!(temp_dir.path(), "config").assert_success()?;
    assert!(result.contains_stdout("showing defaults"));
    assert!(result.contains_stdout("command = \"claude\""));
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(temp_dir.path(), "vigil.toml", "[watch]\ndebounce_ms = 5\n");

    let result = vigil!(temp_dir.path(), "config").assert_failure()?;
    assert!(result.contains_stderr("debounce_ms"));

    write(temp_dir.path(), "vigil.toml", "[watch\n");
    vigil!(temp_dir.path(), "config").assert_failure()?;
    Ok(())
}

#[test]
fn test_usage_on_fresh_project() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let result = vigil!(temp_dir.path(), "usage").assert_success()?;
    assert!(result.contains_stdout("No usage recorded yet"));

    let result = vigil!(temp_dir.path(), "usage", "--json").assert_success()?;
    let summary = result.json()?;
    assert_eq!(summary["total"]["runs"], 0);
    Ok(())
}

#[test]
fn test_usage_reads_ledger() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(
        temp_dir.path(),
        ".vigil/usage.jsonl",
        concat!(
            r#"{"id":"01HXKJ7NVQW3Y2YMZK5VFZX3G8","at":"2025-01-01T00:00:00Z","kind":"review","input_tokens":100,"output_tokens":10,"cost_usd":0.5}"#,
            "\n",
            r#"{"id":"01HXKJ7NVQW3Y2YMZK5VFZX3G9","at":"2025-01-01T00:01:00Z","kind":"apply","input_tokens":50,"output_tokens":5,"cost_usd":null}"#,
            "\n",
            "garbage\n",
        ),
    );

    let result = vigil!(temp_dir.path(), "usage", "--json").assert_success()?;
    let summary = result.json()?;
    assert_eq!(summary["total"]["runs"], 2);
    assert_eq!(summary["total"]["input_tokens"], 150);
    assert_eq!(summary["total"]["uncosted_runs"], 1);
    assert_eq!(summary["by_kind"]["review"]["runs"], 1);
    assert_eq!(summary["skipped_lines"], 1);

    let result = vigil!(temp_dir.path(), "usage").assert_success()?;
    assert!(result.contains_stdout("review"));
    assert!(result.contains_stdout("$0.50"));
    Ok(())
}
