//! Session configuration
//!
//! Loaded once at startup from `<root>/vigil.toml` and passed explicitly to
//! every component. Missing keys fall back to defaults, so an absent file is
//! equivalent to an empty one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the watch root
pub const CONFIG_FILE: &str = "vigil.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value} (expected {range})")]
    OutOfRange {
        key: &'static str,
        value: String,
        range: &'static str,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub envision: EnvisionConfig,
}

/// File monitoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Path segments or file-name globs excluded from monitoring
    pub ignore_patterns: Vec<String>,

    /// Also honour `<root>/.gitignore` (default: false)
    pub use_gitignore: bool,

    /// Quiet period after the last change before a file is analyzed
    pub debounce_ms: u64,

    /// How often the monitor loop polls for settled changes
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            use_gitignore: false,
            debounce_ms: 2000,
            poll_interval_ms: 500,
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Settings for the external analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Executable invoked for every query
    pub command: String,

    /// Optional model override passed through to the service
    pub model: Option<String>,

    pub analysis_timeout_secs: u64,
    pub apply_timeout_secs: u64,

    /// Conversation turn limit per query
    pub max_turns: u32,

    /// USD per million input tokens, used when the service reports no cost
    pub input_price_per_mtok: Option<f64>,

    /// USD per million output tokens, used when the service reports no cost
    pub output_price_per_mtok: Option<f64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            model: None,
            analysis_timeout_secs: 300,
            apply_timeout_secs: 600,
            max_turns: 20,
            input_price_per_mtok: None,
            output_price_per_mtok: None,
        }
    }
}

impl AgentConfig {
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    pub fn apply_timeout(&self) -> Duration {
        Duration::from_secs(self.apply_timeout_secs)
    }

    /// Estimate a cost in USD from token counts and the configured prices
    ///
    /// Returns `None` unless both prices are configured.
    pub fn estimate_cost(&self, input_tokens: u64, output_tokens: u64) -> Option<f64> {
        let input = self.input_price_per_mtok?;
        let output = self.output_price_per_mtok?;
        Some((input_tokens as f64 * input + output_tokens as f64 * output) / 1_000_000.0)
    }
}

/// Settings for idle-time improvement analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvisionConfig {
    /// Maximum concurrent category analyses
    pub max_agents: usize,

    /// Overall time budget for one envision run
    pub max_time_secs: u64,

    /// Scheduler period between backlog checks
    pub idle_interval_secs: u64,
}

impl Default for EnvisionConfig {
    fn default() -> Self {
        Self {
            max_agents: 3,
            max_time_secs: 600,
            idle_interval_secs: 1800,
        }
    }
}

impl EnvisionConfig {
    pub fn max_time(&self) -> Duration {
        Duration::from_secs(self.max_time_secs)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }
}

fn default_ignore_patterns() -> Vec<String> {
    [".git", "__pycache__", "venv", ".venv", "node_modules", "*.pyc", "*.pyo"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl VigilConfig {
    /// Load `<root>/vigil.toml`, or defaults when the file does not exist
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(root);
        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        Self::from_toml(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Location of the config file for a watch root
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check every numeric setting against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("watch.debounce_ms", self.watch.debounce_ms, 50, 60_000, "50-60000")?;
        check("watch.poll_interval_ms", self.watch.poll_interval_ms, 10, 10_000, "10-10000")?;
        check(
            "agent.analysis_timeout_secs",
            self.agent.analysis_timeout_secs,
            1,
            7200,
            "1-7200",
        )?;
        check("agent.apply_timeout_secs", self.agent.apply_timeout_secs, 1, 7200, "1-7200")?;
        check("agent.max_turns", u64::from(self.agent.max_turns), 1, 200, "1-200")?;
        check("envision.max_agents", self.envision.max_agents as u64, 1, 16, "1-16")?;
        check("envision.max_time_secs", self.envision.max_time_secs, 10, 7200, "10-7200")?;
        check(
            "envision.idle_interval_secs",
            self.envision.idle_interval_secs,
            60,
            86_400,
            "60-86400",
        )?;

        for (key, price) in [
            ("agent.input_price_per_mtok", self.agent.input_price_per_mtok),
            ("agent.output_price_per_mtok", self.agent.output_price_per_mtok),
        ] {
            if let Some(price) = price {
                if !price.is_finite() || price < 0.0 {
                    return Err(ConfigError::OutOfRange {
                        key,
                        value: price.to_string(),
                        range: "a non-negative number",
                    });
                }
            }
        }

        Ok(())
    }
}

fn check(key: &'static str, value: u64, min: u64, max: u64, range: &'static str) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            key,
            value: value.to_string(),
            range,
        });
    }
    Ok(())
}

/// Commented example configuration
pub fn example() -> &'static str {
    r#"# vigil.toml - place in the directory being watched

[watch]
# Path segments (exact) or file-name globs that are never analyzed
ignore_patterns = [".git", "__pycache__", "venv", ".venv", "node_modules", "*.pyc", "*.pyo"]
# Also skip paths matched by .gitignore
use_gitignore = false
# Quiet period after the last edit before analysis (50-60000)
debounce_ms = 2000
# How often settled changes are collected (10-10000)
poll_interval_ms = 500

[agent]
command = "claude"
# model = "sonnet"
analysis_timeout_secs = 300
apply_timeout_secs = 600
max_turns = 20
# Used to estimate cost when the service reports none
# input_price_per_mtok = 3.0
# output_price_per_mtok = 15.0

[envision]
max_agents = 3
max_time_secs = 600
# How often the scheduler checks the backlog (60-86400)
idle_interval_secs = 1800
"#
}
