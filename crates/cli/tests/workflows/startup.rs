//! Fatal startup errors

use crate::vigil;
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_watch_missing_root_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let missing = temp_dir.path().join("does-not-exist");
    let missing = missing.to_str().expect("utf-8 temp path");

    let result = vigil!(temp_dir.path(), "watch", "--root", missing).assert_failure()?;
    assert!(result.contains_stderr("Cannot watch project"));
    Ok(())
}

#[test]
fn test_watch_rejects_out_of_range_debounce() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let result = vigil!(temp_dir.path(), "watch", "--debounce-ms", "1").assert_failure()?;
    assert!(result.contains_stderr("debounce"));
    Ok(())
}

#[test]
fn test_envision_rejects_unknown_category() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let result = vigil!(temp_dir.path(), "envision", "--category", "style").assert_failure()?;
    assert!(result.contains_stderr("unknown category"));
    Ok(())
}
