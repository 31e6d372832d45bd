//! Append-only token usage ledger
//!
//! One JSON object per line in `<root>/.vigil/usage.jsonl`. Entries are never
//! rewritten; totals are computed by scanning the file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use ulid::Ulid;

const LEDGER_FILE: &str = "usage.jsonl";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("usage ledger I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode usage entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What consumed the tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    /// Read-only analysis of changed files
    Review,
    /// Write-enabled application of an approved fix
    Apply,
    /// Idle-time improvement proposals
    Envision,
}

impl UsageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::Review => "review",
            UsageKind::Apply => "apply",
            UsageKind::Envision => "envision",
        }
    }
}

/// One ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub id: Ulid,
    pub at: DateTime<Utc>,
    pub kind: UsageKind,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Reported or estimated cost; `None` when neither is available
    pub cost_usd: Option<f64>,
}

impl UsageEntry {
    pub fn new(kind: UsageKind, input_tokens: u64, output_tokens: u64, cost_usd: Option<f64>) -> Self {
        Self {
            id: Ulid::new(),
            at: Utc::now(),
            kind,
            input_tokens,
            output_tokens,
            cost_usd,
        }
    }
}

/// Totals for one kind of usage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    pub runs: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    /// Runs that carried no cost information
    pub uncosted_runs: usize,
}

impl UsageTotals {
    fn add(&mut self, entry: &UsageEntry) {
        self.runs += 1;
        self.input_tokens += entry.input_tokens;
        self.output_tokens += entry.output_tokens;
        match entry.cost_usd {
            Some(cost) => self.cost_usd += cost,
            None => self.uncosted_runs += 1,
        }
    }
}

/// Ledger totals, overall and per kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    pub total: UsageTotals,
    pub by_kind: BTreeMap<UsageKind, UsageTotals>,
    /// Lines that could not be decoded
    pub skipped_lines: usize,
}

/// Handle to the ledger file of one project
#[derive(Debug, Clone)]
pub struct UsageLedger {
    path: PathBuf,
}

impl UsageLedger {
    /// Ledger for the project rooted at `root`
    pub fn for_root(root: &Path) -> Self {
        Self {
            path: root.join(crate::STATE_DIR).join(LEDGER_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the state directory if needed
    pub fn append(&self, entry: &UsageEntry) -> Result<(), LedgerError> {
        let line = serde_json::to_string(entry)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;

        writeln!(file, "{}", line).map_err(|source| self.io_error(source))?;
        Ok(())
    }

    /// Append, logging instead of failing
    ///
    /// Usage tracking must never interrupt monitoring.
    pub fn record(&self, entry: &UsageEntry) {
        if let Err(e) = self.append(entry) {
            tracing::warn!("Failed to record {} usage: {}", entry.kind.as_str(), e);
        }
    }

    /// Read every decodable entry; a missing ledger is empty
    pub fn entries(&self) -> Result<(Vec<UsageEntry>, usize), LedgerError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(source) => return Err(self.io_error(source)),
        };

        let mut entries = Vec::new();
        let mut skipped = 0;
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<UsageEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!("Skipping malformed ledger line {}: {}", lineno + 1, e);
                    skipped += 1;
                }
            }
        }

        Ok((entries, skipped))
    }

    /// Totals across the whole ledger
    pub fn summary(&self) -> Result<UsageSummary, LedgerError> {
        let (entries, skipped_lines) = self.entries()?;

        let mut summary = UsageSummary {
            skipped_lines,
            ..Default::default()
        };
        for entry in &entries {
            summary.total.add(entry);
            summary.by_kind.entry(entry.kind).or_default().add(entry);
        }

        Ok(summary)
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
