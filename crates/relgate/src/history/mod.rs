//! Revision-history sources.
//!
//! The resolver consumes version-control history through the [`RevisionLog`]
//! trait. Two implementations ship with the crate:
//!
//! - **Subversion** ([`svn::SvnLog`]): drives the `svn log` CLI against a
//!   working copy.
//! - **In-memory** ([`in_memory::InMemoryHistory`]): map-backed source for
//!   tests, fixtures, and offline use.
//!
//! # Architecture
//!
//! The trait is async and object-safe, so the composition root can hand out
//! `Box<dyn RevisionLog>` and the resolver can stay backend-agnostic.
//! Per-file history is exposed as a lazy stream rather than a vector: a
//! file's history may be arbitrarily long, and the resolver only ever looks
//! at a bounded window of it.

use crate::domain::{LogEntry, RevisionNumber};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

pub mod in_memory;
pub mod svn;

/// Capability surface of the version-control collaborator.
///
/// Implementations must be `Send + Sync` to support concurrent resolutions
/// on separate tasks.
#[async_trait]
pub trait RevisionLog: Send + Sync {
    /// Fetch the single history entry at `revision`, with its changelist.
    ///
    /// # Errors
    ///
    /// - `Error::RevisionNotFound` if the revision does not exist
    /// - `Error::Transport` if the backing system is unreachable
    async fn entry(&self, revision: RevisionNumber) -> Result<LogEntry>;

    /// Stream a file's history, newest first.
    ///
    /// The stream is lazy and restartable: each call starts a fresh
    /// traversal, and consumers are expected to stop polling once their scan
    /// bound is reached. Implementations must not materialize the full
    /// history eagerly.
    ///
    /// A path that is unavailable in history (renamed, moved, or deleted
    /// since) yields `Error::HistoryUnavailable` as its first item.
    fn file_history(&self, path: &str) -> BoxStream<'_, Result<LogEntry>>;

    /// Entries at or after `since` whose message matches `term`, optionally
    /// restricted to the subtree under `branch`.
    ///
    /// Matching is case-insensitive on the message text. Order of the
    /// returned entries is unspecified; callers aggregate over the whole
    /// result.
    async fn search(
        &self,
        since: DateTime<Utc>,
        term: &str,
        branch: Option<&str>,
    ) -> Result<Vec<LogEntry>>;
}
