//! Implementation of the `init` command.
//!
//! Handles initialization of a relgate project, creating the `.relgate/`
//! directory with a default configuration, and owns the [`GateConfig`]
//! structure that every other part of the crate reads.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default issue-key pattern (written against uppercased text).
pub const DEFAULT_PATTERN: &str = "[A-Z][A-Z0-9]*-[0-9]+";

/// Name of the relgate directory.
pub const GATE_DIR_NAME: &str = ".relgate";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default per-file scan depth.
pub const DEFAULT_MAX_SCAN_DEPTH: usize = 10;

/// Maximum directory depth to traverse when searching for the gate root.
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure for relgate.
///
/// Loaded once at the composition root into an immutable value; the
/// resolver only ever borrows it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateConfig {
    /// Regular expression extracting issue keys from commit messages.
    #[serde(rename = "issue-pattern")]
    pub issue_pattern: String,

    /// Version-control history configuration.
    pub history: HistoryConfig,

    /// Issue-tracker configuration.
    pub tracker: TrackerConfig,
}

/// History-source configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Working-copy path, relative to the project root.
    #[serde(rename = "working-copy")]
    pub working_copy: String,

    /// File extensions (without the dot) eligible for auditing.
    #[serde(rename = "accepted-extensions")]
    pub accepted_extensions: Vec<String>,

    /// Maximum number of history entries examined per file.
    #[serde(rename = "max-scan-depth")]
    pub max_scan_depth: usize,

    /// Optional branch path restriction for by-issue history searches
    /// (e.g. `/branches/dev`).
    #[serde(rename = "dev-branch", default)]
    pub dev_branch: Option<String>,
}

/// Tracker configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Base URL of the tracker server.
    pub server: String,

    /// Statuses that are never reported as blocking.
    #[serde(rename = "statuses-to-ignore")]
    pub statuses_to_ignore: Vec<String>,
}

impl GateConfig {
    /// Create a configuration with the given issue-key pattern and defaults
    /// everywhere else.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            issue_pattern: pattern.to_string(),
            history: HistoryConfig {
                working_copy: ".".to_string(),
                accepted_extensions: vec!["cpp".to_string(), "h".to_string(), "cs".to_string()],
                max_scan_depth: DEFAULT_MAX_SCAN_DEPTH,
                dev_branch: None,
            },
            tracker: TrackerConfig {
                server: "https://jira.example.com".to_string(),
                statuses_to_ignore: vec!["Closed".to_string(), "Resolved".to_string()],
            },
        }
    }

    /// Load configuration from a file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Validate field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        validate_pattern(&self.issue_pattern)?;
        if self.history.max_scan_depth == 0 {
            return Err(Error::Config(
                "max-scan-depth must be at least 1".to_string(),
            ));
        }
        if self.history.accepted_extensions.is_empty() {
            return Err(Error::Config(
                "accepted-extensions must name at least one extension".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a changed path's extension is in the accepted set.
    #[must_use]
    pub fn accepts_extension(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.history
                    .accepted_extensions
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(ext))
            })
    }

    /// Whether a tracker status belongs to the configured ignore-set.
    #[must_use]
    pub fn is_ignored_status(&self, status: &crate::domain::IssueStatus) -> bool {
        status.is_ignored(&self.tracker.statuses_to_ignore)
    }

    /// The per-file scan depth bound.
    #[must_use]
    pub fn max_scan_depth(&self) -> usize {
        self.history.max_scan_depth
    }

    /// The branch restriction for by-issue searches, if configured.
    #[must_use]
    pub fn dev_branch(&self) -> Option<&str> {
        self.history.dev_branch.as_deref()
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

/// Validate an issue-key pattern.
pub fn validate_pattern(pattern: &str) -> Result<()> {
    crate::extract::KeyExtractor::new(pattern).map(|_| ())
}

/// Result of the init command.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created relgate directory.
    pub gate_dir: PathBuf,
    /// Path to the created config file.
    pub config_file: PathBuf,
    /// The issue-key pattern written into the config.
    pub pattern: String,
}

/// Initialize a relgate project in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.relgate/` directory already exists
/// - The pattern is invalid
/// - File system operations fail
pub async fn init(base_dir: &Path, pattern: Option<&str>) -> Result<InitResult> {
    let pattern = pattern.unwrap_or(DEFAULT_PATTERN).trim();
    validate_pattern(pattern)?;

    let gate_dir = base_dir.join(GATE_DIR_NAME);
    if gate_dir.exists() {
        return Err(Error::Config(format!(
            "relgate is already initialized in this directory. Found existing '{GATE_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&gate_dir).await?;

    let config_file = gate_dir.join(CONFIG_FILE_NAME);
    let config = GateConfig::new(pattern);
    config.save(&config_file).await?;

    Ok(InitResult {
        gate_dir,
        config_file,
        pattern: pattern.to_string(),
    })
}

/// Find the project root by searching up the directory tree for `.relgate/`.
///
/// Returns `Some(path)` with the directory containing `.relgate/`, or
/// `None` if no project is found within the depth limit.
#[must_use]
pub fn find_gate_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(GATE_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
