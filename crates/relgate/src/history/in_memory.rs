//! In-memory revision history.
//!
//! A map-backed [`RevisionLog`] used by the test suite and available to
//! embedders that already hold history in memory (fixtures, replays,
//! offline audits).

use super::RevisionLog;
use crate::domain::{LogEntry, RevisionNumber};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeSet;

/// In-memory [`RevisionLog`] backed by a sorted entry list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    /// Entries in ascending revision order.
    entries: Vec<LogEntry>,

    /// Paths whose history is deliberately unavailable (simulates renames
    /// and deletions for error-path coverage).
    unavailable: BTreeSet<String>,
}

impl InMemoryHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history from the given entries (any order; sorted on entry).
    #[must_use]
    pub fn with_entries(mut entries: Vec<LogEntry>) -> Self {
        entries.sort_by_key(|e| e.revision);
        Self {
            entries,
            unavailable: BTreeSet::new(),
        }
    }

    /// Add a single entry, keeping revision order.
    pub fn push(&mut self, entry: LogEntry) {
        let at = self
            .entries
            .partition_point(|e| e.revision <= entry.revision);
        self.entries.insert(at, entry);
    }

    /// Mark a path as unavailable: its history stream will yield
    /// `Error::HistoryUnavailable` instead of entries.
    #[must_use]
    pub fn with_unavailable(mut self, path: impl Into<String>) -> Self {
        self.unavailable.insert(path.into());
        self
    }
}

#[async_trait]
impl RevisionLog for InMemoryHistory {
    async fn entry(&self, revision: RevisionNumber) -> Result<LogEntry> {
        self.entries
            .iter()
            .find(|e| e.revision == revision)
            .cloned()
            .ok_or(Error::RevisionNotFound(revision))
    }

    fn file_history(&self, path: &str) -> BoxStream<'_, Result<LogEntry>> {
        if self.unavailable.contains(path) {
            let path = path.to_string();
            return stream::once(async move { Err(Error::HistoryUnavailable { path }) }).boxed();
        }
        let path = path.to_string();
        stream::iter(
            self.entries
                .iter()
                .rev()
                .filter(move |e| e.changed_paths.iter().any(|p| *p == path))
                .map(|e| Ok(e.clone())),
        )
        .boxed()
    }

    async fn search(
        &self,
        since: DateTime<Utc>,
        term: &str,
        branch: Option<&str>,
    ) -> Result<Vec<LogEntry>> {
        let term = term.to_uppercase();
        Ok(self
            .entries
            .iter()
            .filter(|e| e.timestamp >= since)
            .filter(|e| e.message.to_uppercase().contains(&term))
            .filter(|e| {
                branch.is_none_or(|b| e.changed_paths.iter().any(|p| p.starts_with(b)))
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(revision: u64, message: &str, paths: &[&str]) -> LogEntry {
        LogEntry {
            revision: RevisionNumber::new(revision),
            message: message.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
                + chrono::Duration::minutes(i64::try_from(revision).unwrap()),
            changed_paths: paths.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn entry_lookup_finds_revision() {
        let history = InMemoryHistory::with_entries(vec![entry(10, "PROJ-1 init", &["/a.cpp"])]);
        let found = history.entry(RevisionNumber::new(10)).await.unwrap();
        assert_eq!(found.message, "PROJ-1 init");
    }

    #[tokio::test]
    async fn entry_lookup_reports_missing_revision() {
        let history = InMemoryHistory::new();
        let err = history.entry(RevisionNumber::new(7)).await.unwrap_err();
        assert!(matches!(err, Error::RevisionNotFound(r) if r == RevisionNumber::new(7)));
    }

    #[tokio::test]
    async fn file_history_is_newest_first() {
        let history = InMemoryHistory::with_entries(vec![
            entry(10, "first", &["/a.cpp"]),
            entry(30, "third", &["/a.cpp"]),
            entry(20, "second", &["/a.cpp", "/b.cpp"]),
        ]);

        let revisions: Vec<u64> = history
            .file_history("/a.cpp")
            .map(|e| e.unwrap().revision.0)
            .collect()
            .await;
        assert_eq!(revisions, vec![30, 20, 10]);
    }

    #[tokio::test]
    async fn file_history_reports_unavailable_path() {
        let history = InMemoryHistory::new().with_unavailable("/gone.cpp");
        let mut stream = history.file_history("/gone.cpp");
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(Error::HistoryUnavailable { path }) if path == "/gone.cpp"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn search_filters_by_time_term_and_branch() {
        let history = InMemoryHistory::with_entries(vec![
            entry(10, "PROJ-5 start", &["/branches/dev/b.cpp"]),
            entry(20, "proj-5 more", &["/trunk/c.cpp"]),
            entry(30, "unrelated", &["/branches/dev/b.cpp"]),
        ]);

        let since = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let all = history.search(since, "PROJ-5", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let dev_only = history
            .search(since, "PROJ-5", Some("/branches/dev"))
            .await
            .unwrap();
        assert_eq!(dev_only.len(), 1);
        assert_eq!(dev_only[0].revision, RevisionNumber::new(10));
    }

    #[tokio::test]
    async fn search_respects_since_bound() {
        let history = InMemoryHistory::with_entries(vec![
            entry(10, "PROJ-5 early", &["/a.cpp"]),
            entry(40, "PROJ-5 late", &["/a.cpp"]),
        ]);

        // since falls between the two entries
        let since = Utc.with_ymd_and_hms(2024, 5, 1, 12, 20, 0).unwrap();
        let found = history.search(since, "PROJ-5", None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].revision, RevisionNumber::new(40));
    }
}
