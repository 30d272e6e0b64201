//! Error types for relgate operations.
//!
//! Failures from the history and tracker collaborators are classified here
//! rather than bubbled up as opaque strings, so the caller-facing layer can
//! map each kind to a short user message and re-raise anything it does not
//! recognize.

use crate::domain::{IssueKey, RevisionNumber};
use std::io;
use thiserror::Error;

/// The error type for relgate operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied an unparseable or absent revision/issue selector.
    #[error("invalid input: {0}")]
    Input(String),

    /// A multi-issue request exceeded the per-invocation cap.
    #[error("too many issue keys in one request: {given} given, at most {max} allowed")]
    TooManyIssues {
        /// Number of keys the caller supplied.
        given: usize,
        /// Configured per-request maximum.
        max: usize,
    },

    /// The requested revision does not exist in the history source.
    #[error("no such revision: r{0}")]
    RevisionNotFound(RevisionNumber),

    /// The requested issue key does not exist in the tracker.
    #[error("no such issue: {0}")]
    IssueNotFound(IssueKey),

    /// A file expected at a historical point is unavailable (renamed, moved,
    /// or deleted since).
    #[error("history unavailable for '{path}'")]
    HistoryUnavailable {
        /// Path whose history could not be read.
        path: String,
    },

    /// The issue tracker reported a failure for a specific key, distinct
    /// from "does not exist".
    #[error("tracker error for {key}: {reason}")]
    Tracker {
        /// Key the tracker was queried for.
        key: IssueKey,
        /// Tracker-reported failure detail.
        reason: String,
    },

    /// A backing collaborator is unreachable, or an external call timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized Result type for relgate operations.
pub type Result<T> = std::result::Result<T, Error>;
