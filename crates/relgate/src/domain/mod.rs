//! Domain types for dependency auditing.
//!
//! Everything here is an immutable value type with value equality. Entities
//! are created and consumed within a single resolution call; nothing is
//! shared or mutated after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Monotonically increasing identifier of a point in version-control history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RevisionNumber(pub u64);

impl RevisionNumber {
    /// Create a new revision number.
    #[must_use]
    pub fn new(number: u64) -> Self {
        Self(number)
    }
}

impl fmt::Display for RevisionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RevisionNumber {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

impl FromStr for RevisionNumber {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both "123" and the conventional "r123" form.
        let digits = s.strip_prefix(['r', 'R']).unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| crate::error::Error::Input(format!("not a revision number: '{s}'")))
    }
}

/// Identifier referencing a tracked unit of work, embedded in commit messages.
///
/// Identity is exact-match on the uppercased form; construction normalizes,
/// so `IssueKey::new("proj-1") == IssueKey::new("PROJ-1")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueKey(String);

impl IssueKey {
    /// Create a new issue key, normalizing to uppercase.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().to_uppercase())
    }

    /// The normalized key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IssueKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for IssueKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Tracker-reported status of an issue.
///
/// The status is an opaque string owned by the tracker; relgate only
/// classifies it against the configured ignore-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueStatus(String);

impl IssueStatus {
    /// Create a new status from the tracker-reported string.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// The status text as reported by the tracker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this status belongs to the given ignore-set.
    ///
    /// Comparison is case-insensitive; trackers are not consistent about
    /// status casing across versions.
    #[must_use]
    pub fn is_ignored(&self, ignore_set: &[String]) -> bool {
        ignore_set.iter().any(|s| s.eq_ignore_ascii_case(&self.0))
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IssueStatus {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A single change-log entry: one revision with its message, timestamp, and
/// ordered changelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Revision at which this change was committed.
    pub revision: RevisionNumber,

    /// Full commit message text.
    pub message: String,

    /// Commit timestamp (UTC).
    pub timestamp: DateTime<Utc>,

    /// Paths modified by this revision, in the order the history source
    /// reports them.
    pub changed_paths: Vec<String>,
}

/// Immutable record of an open reference found while scanning a file's
/// history.
///
/// A record's status is never a member of the configured ignore-set; ignored
/// references are dropped before a record is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// The referenced issue key.
    pub key: IssueKey,

    /// The issue's current tracker-reported status.
    pub status: IssueStatus,
}

/// A file name plus the open dependencies found for it.
///
/// Records are unique by issue key (set semantics) and kept in the order the
/// scan discovered them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDependencySummary {
    /// File path relative to the audited tree.
    pub file: String,

    /// Open dependency records, unique by key.
    pub records: Vec<DependencyRecord>,
}

impl FileDependencySummary {
    /// Whether the scan found no open dependencies for this file.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.records.is_empty()
    }
}

/// Outcome of one resolution call.
///
/// Produced fresh per query; the resolver holds no state between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// The target's issue key, when one could be extracted.
    ///
    /// `None` is valid output meaning "no dependency tracking possible for
    /// this target" and is NOT an error; callers decide policy (warn vs.
    /// proceed).
    pub target_key: Option<IssueKey>,

    /// The revision used as the upper bound for per-file scans: the audited
    /// revision itself, or the maximum revision observed when resolving by
    /// issue.
    pub effective_revision: RevisionNumber,

    /// Per-file open-dependency summaries, in candidate-file order.
    pub files: Vec<FileDependencySummary>,
}

impl ResolutionResult {
    /// Whether any file carries at least one open dependency.
    ///
    /// Presentation layers use this to drive severity indicators and the
    /// process exit code.
    #[must_use]
    pub fn has_open_dependencies(&self) -> bool {
        self.files.iter().any(|f| !f.is_clean())
    }
}

/// The revision or issue under audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Audit the change committed at this revision.
    ByRevision(RevisionNumber),

    /// Audit all changes committed under this issue key.
    ByIssue(IssueKey),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_key_normalizes_case() {
        assert_eq!(IssueKey::new("proj-1"), IssueKey::new("PROJ-1"));
        assert_eq!(IssueKey::new("Proj-1").as_str(), "PROJ-1");
    }

    #[test]
    fn revision_number_parses_with_and_without_prefix() {
        assert_eq!("123".parse::<RevisionNumber>().unwrap(), RevisionNumber(123));
        assert_eq!("r123".parse::<RevisionNumber>().unwrap(), RevisionNumber(123));
        assert!("r12x".parse::<RevisionNumber>().is_err());
        assert!("".parse::<RevisionNumber>().is_err());
    }

    #[test]
    fn status_ignore_set_is_case_insensitive() {
        let ignored = vec!["Closed".to_string(), "Resolved".to_string()];
        assert!(IssueStatus::new("closed").is_ignored(&ignored));
        assert!(IssueStatus::new("RESOLVED").is_ignored(&ignored));
        assert!(!IssueStatus::new("Open").is_ignored(&ignored));
    }

    #[test]
    fn result_reports_open_dependencies() {
        let clean = FileDependencySummary {
            file: "a.cpp".to_string(),
            records: vec![],
        };
        let dirty = FileDependencySummary {
            file: "b.cpp".to_string(),
            records: vec![DependencyRecord {
                key: IssueKey::new("PROJ-2"),
                status: IssueStatus::new("Open"),
            }],
        };

        let result = ResolutionResult {
            target_key: Some(IssueKey::new("PROJ-1")),
            effective_revision: RevisionNumber::new(100),
            files: vec![clean.clone()],
        };
        assert!(!result.has_open_dependencies());

        let result = ResolutionResult {
            target_key: Some(IssueKey::new("PROJ-1")),
            effective_revision: RevisionNumber::new(100),
            files: vec![clean, dirty],
        };
        assert!(result.has_open_dependencies());
    }
}
