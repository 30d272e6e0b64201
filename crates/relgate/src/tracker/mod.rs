//! Issue-tracker clients.
//!
//! The resolver consumes tracker state through the [`IssueTracker`] trait.
//! Two implementations ship with the crate:
//!
//! - **Jira** ([`jira::JiraClient`]): REST v2 client authenticated with a
//!   personal access token.
//! - **In-memory** ([`in_memory::StaticTracker`]): fixed-map tracker for
//!   tests and fixtures.

use crate::domain::{IssueKey, IssueStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod in_memory;
pub mod jira;

/// Capability surface of the issue-tracker collaborator.
///
/// Implementations must be `Send + Sync` to support concurrent resolutions
/// on separate tasks.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Current tracker-reported status for `key`.
    ///
    /// # Errors
    ///
    /// - `Error::IssueNotFound` if the key does not exist
    /// - `Error::Tracker` for tracker-reported failures other than "does
    ///   not exist"
    /// - `Error::Transport` if the tracker is unreachable or the call
    ///   timed out
    async fn status(&self, key: &IssueKey) -> Result<IssueStatus>;

    /// Creation timestamp for `key`.
    ///
    /// # Errors
    ///
    /// Same classification as [`IssueTracker::status`].
    async fn created(&self, key: &IssueKey) -> Result<DateTime<Utc>>;
}
