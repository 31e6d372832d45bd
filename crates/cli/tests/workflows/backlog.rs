//! `vigil tasks`

use crate::common::write;
use crate::vigil;
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_tasks_empty_project() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let result = vigil!(temp_dir.path(), "tasks").assert_success()?;
    assert!(result.contains_stdout("No pending tasks"));

    let result = vigil!(temp_dir.path(), "tasks", "--json").assert_success()?;
    assert_eq!(result.json()?, serde_json::json!([]));
    Ok(())
}

#[test]
fn test_tasks_sorted_across_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(
        temp_dir.path(),
        "TODO.md",
        "# TODO\n\n## In Progress\n\n_No tasks currently in progress_\n\n\
         ## Backlog\n\n### [LOW] @docs - Update README\n### [HIGH] @bug - Fix crash\n\n\
         ## Completed\n\n### [HIGH] @feature - Old work\n",
    );
    write(temp_dir.path(), "PLAN.md", "## Phase 1\n- [x] Done\n- [ ] Write tests\n");
    write(temp_dir.path(), "CLAUDE.md", "# Context\n\nTODO: Review error handling\n");

    let result = vigil!(temp_dir.path(), "tasks", "--json").assert_success()?;
    let tasks = result.json()?;
    let tasks = tasks.as_array().expect("array");

    let titles: Vec<&str> = tasks.iter().filter_map(|t| t["title"].as_str()).collect();
    assert_eq!(
        titles,
        vec!["Fix crash", "Update README", "Write tests", "Review error handling"]
    );
    assert_eq!(tasks[0]["priority"], "HIGH");
    assert_eq!(tasks[0]["type"], "@bug");
    assert_eq!(tasks[2]["source"], "PLAN.md");

    let result = vigil!(temp_dir.path(), "tasks").assert_success()?;
    assert!(result.contains_stdout("Pending Tasks"));
    assert!(result.contains_stdout("Fix crash"));
    Ok(())
}
