//! Common utilities for integration tests

pub mod cli;

use std::fs;
use std::path::Path;

/// Write a file, creating parent directories
pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Install a stand-in for the analysis CLI that always prints `result`
///
/// Returns the script path; point `agent.command` at it in vigil.toml.
#[cfg(unix)]
#[allow(dead_code)]
pub fn fake_service(root: &Path, result: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = root.join("fake-claude.sh");
    let body = format!("#!/bin/sh\ncat <<'EOF'\n{}\nEOF\n", result);
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}
