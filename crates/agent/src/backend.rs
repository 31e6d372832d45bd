//! Boundary to the external analysis service
//!
//! The service is opaque: it receives a prompt plus a permission mode and
//! returns free text with optional token accounting. [`ClaudeCli`] talks to it
//! through the `claude` command line in print mode.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use vigil_core::AgentConfig;

/// Errors from a single service call
///
/// None of these are fatal to monitoring; callers log them and carry on.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {code:?}: {stderr}")]
    Exited {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("analysis service reported an error: {0}")]
    Service(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// What the service is allowed to do during a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Inspection only; produces a proposal without touching files
    ReadOnly,
    /// May edit files; used only after explicit approval
    WriteEnabled,
}

impl Mode {
    /// Tools the service may use in this mode
    pub fn allowed_tools(&self) -> &'static [&'static str] {
        match self {
            Mode::ReadOnly => &["Read", "Glob", "Grep"],
            Mode::WriteEnabled => &["Read", "Edit", "Write", "Glob", "Grep"],
        }
    }
}

/// One request to the service
#[derive(Debug, Clone)]
pub struct Query {
    pub prompt: String,
    pub mode: Mode,
    pub max_turns: u32,
}

impl Query {
    pub fn read_only(prompt: impl Into<String>, max_turns: u32) -> Self {
        Self {
            prompt: prompt.into(),
            mode: Mode::ReadOnly,
            max_turns,
        }
    }

    pub fn write_enabled(prompt: impl Into<String>, max_turns: u32) -> Self {
        Self {
            prompt: prompt.into(),
            mode: Mode::WriteEnabled,
            max_turns,
        }
    }
}

/// Token accounting reported by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cost_usd: Option<f64>,
}

impl Usage {
    /// Accumulate another call's usage into this one
    ///
    /// Cost stays `None` only while neither side has one.
    pub fn merge(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
        self.cache_creation_tokens += other.cache_creation_tokens;
        self.cost_usd = match (self.cost_usd, other.cost_usd) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
        };
    }

    /// Total tokens billed as input, including cache traffic
    pub fn total_input(&self) -> u64 {
        self.input_tokens + self.cache_read_tokens + self.cache_creation_tokens
    }
}

/// Service response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub text: String,
    pub usage: Option<Usage>,
    /// Conversation turns the service used, when reported
    pub turns: Option<u32>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// The analysis service
#[async_trait]
pub trait Backend: Send + Sync {
    async fn query(&self, query: &Query) -> Result<Reply, BackendError>;
}

/// Service access through the `claude` CLI in print mode
///
/// Each query spawns one process in the project root. The child is killed if
/// the returned future is dropped, so cancelling a call cancels the process.
#[derive(Debug, Clone)]
pub struct ClaudeCli {
    command: String,
    model: Option<String>,
    cwd: PathBuf,
}

impl ClaudeCli {
    pub fn new(command: impl Into<String>, cwd: &Path) -> Self {
        Self {
            command: command.into(),
            model: None,
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn from_config(config: &AgentConfig, cwd: &Path) -> Self {
        Self {
            command: config.command.clone(),
            model: config.model.clone(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// Command-line arguments for a query
    pub fn args(&self, query: &Query) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            query.prompt.clone(),
            "--output-format".to_string(),
            "json".to_string(),
            "--allowedTools".to_string(),
            query.mode.allowed_tools().join(","),
            "--max-turns".to_string(),
            query.max_turns.to_string(),
        ];

        if let Some(ref model) = self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        if query.mode == Mode::WriteEnabled {
            args.push("--permission-mode".to_string());
            args.push("acceptEdits".to_string());
        }

        args
    }
}

#[async_trait]
impl Backend for ClaudeCli {
    async fn query(&self, query: &Query) -> Result<Reply, BackendError> {
        tracing::debug!("Running {} ({:?}, max {} turns)", self.command, query.mode, query.max_turns);

        let output = tokio::process::Command::new(&self.command)
            .args(self.args(query))
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BackendError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_result(&stdout) {
            Ok(reply) => Ok(reply),
            // A failed exit without a parsable result is reported as the exit
            Err(_) if !output.status.success() => Err(BackendError::Exited {
                command: self.command.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

/// Final result message printed by the CLI
#[derive(Debug, Deserialize)]
struct ResultMessage {
    #[serde(rename = "type")]
    kind: Option<String>,
    subtype: Option<String>,
    #[serde(default)]
    is_error: bool,
    result: Option<String>,
    num_turns: Option<u32>,
    total_cost_usd: Option<f64>,
    usage: Option<RawUsage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_read_input_tokens: u64,
    #[serde(default)]
    cache_creation_input_tokens: u64,
}

/// Extract the reply from CLI output
///
/// Accepts a single result object, an array of messages, or one message per
/// line; in the latter two cases the last `result` message wins.
pub fn parse_result(stdout: &str) -> Result<Reply, BackendError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(BackendError::Malformed("empty output".to_string()));
    }

    let message = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Array(messages)) => last_result(messages.into_iter()),
        Ok(value) => Some(value),
        Err(_) => last_result(
            trimmed
                .lines()
                .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok()),
        ),
    }
    .ok_or_else(|| BackendError::Malformed("no result message in output".to_string()))?;

    let message: ResultMessage =
        serde_json::from_value(message).map_err(|e| BackendError::Malformed(e.to_string()))?;

    if let Some(ref kind) = message.kind {
        if kind != "result" {
            return Err(BackendError::Malformed(format!("unexpected message type '{}'", kind)));
        }
    }

    if message.is_error {
        let detail = message
            .result
            .or(message.subtype)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(BackendError::Service(detail));
    }

    let text = message
        .result
        .ok_or_else(|| BackendError::Malformed("result message has no text".to_string()))?;

    let usage = match (message.usage, message.total_cost_usd) {
        (None, None) => None,
        (raw, cost) => {
            let raw = raw.unwrap_or_default();
            Some(Usage {
                input_tokens: raw.input_tokens,
                output_tokens: raw.output_tokens,
                cache_read_tokens: raw.cache_read_input_tokens,
                cache_creation_tokens: raw.cache_creation_input_tokens,
                cost_usd: cost,
            })
        }
    };

    Ok(Reply {
        text,
        usage,
        turns: message.num_turns,
    })
}

fn last_result(messages: impl Iterator<Item = serde_json::Value>) -> Option<serde_json::Value> {
    messages
        .filter(|m| m.get("type").and_then(|t| t.as_str()) == Some("result"))
        .last()
}
