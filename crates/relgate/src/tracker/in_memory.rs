//! In-memory issue tracker.

use super::IssueTracker;
use crate::domain::{IssueKey, IssueStatus};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Fixed-map [`IssueTracker`] for tests and fixtures.
///
/// Holds a static set of issues; lookups for unknown keys report
/// `Error::IssueNotFound`, matching the real tracker's contract.
#[derive(Debug, Clone, Default)]
pub struct StaticTracker {
    issues: HashMap<IssueKey, (IssueStatus, DateTime<Utc>)>,
}

impl StaticTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue, builder-style.
    #[must_use]
    pub fn with_issue(
        mut self,
        key: impl Into<IssueKey>,
        status: impl Into<IssueStatus>,
        created: DateTime<Utc>,
    ) -> Self {
        self.issues.insert(key.into(), (status.into(), created));
        self
    }
}

#[async_trait]
impl IssueTracker for StaticTracker {
    async fn status(&self, key: &IssueKey) -> Result<IssueStatus> {
        self.issues
            .get(key)
            .map(|(status, _)| status.clone())
            .ok_or_else(|| Error::IssueNotFound(key.clone()))
    }

    async fn created(&self, key: &IssueKey) -> Result<DateTime<Utc>> {
        self.issues
            .get(key)
            .map(|(_, created)| *created)
            .ok_or_else(|| Error::IssueNotFound(key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn lookups_return_inserted_state() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let tracker = StaticTracker::new().with_issue("proj-1", "Open", created);

        let key = IssueKey::new("PROJ-1");
        assert_eq!(tracker.status(&key).await.unwrap(), IssueStatus::new("Open"));
        assert_eq!(tracker.created(&key).await.unwrap(), created);
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let tracker = StaticTracker::new();
        let err = tracker.status(&IssueKey::new("PROJ-9")).await.unwrap_err();
        assert!(matches!(err, Error::IssueNotFound(k) if k == IssueKey::new("PROJ-9")));
    }
}
