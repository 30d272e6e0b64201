//! Target resolution and per-file dependency scanning.
//!
//! This is the core of relgate. Given a target (a revision or an issue
//! key), the resolver determines the files the target touches, walks each
//! file's history within a bounded window, extracts co-referenced issue
//! keys from commit messages, resolves each key's current status against
//! the tracker, and aggregates the still-open ones per file.
//!
//! # Algorithm
//!
//! Per candidate file, independently:
//!
//! 1. Stream the file's history newest-first.
//! 2. Discard entries above the effective revision: the scan never
//!    considers changes that happen after the point being audited, and
//!    discarded entries do not consume the depth budget.
//! 3. Scanned (non-discarded) entries count toward the per-file depth
//!    bound; the stream is dropped as soon as the bound is reached.
//! 4. An entry mentioning the target's own key belongs to the same logical
//!    change set and is skipped entirely.
//! 5. Every other key is resolved against the tracker once per file
//!    (de-duplicated); statuses in the ignore-set are dropped, the rest
//!    become [`DependencyRecord`]s.
//!
//! The resolver holds only borrowed collaborators and immutable
//! configuration, so concurrent resolutions for different targets may run
//! on separate tasks.

use crate::commands::init::GateConfig;
use crate::domain::{
    DependencyRecord, FileDependencySummary, IssueKey, ResolutionResult, RevisionNumber, Target,
};
use crate::error::{Error, Result};
use crate::extract::KeyExtractor;
use crate::history::RevisionLog;
use crate::tracker::IssueTracker;
use futures::StreamExt;
use std::collections::BTreeSet;

/// Upper bound on issue keys accepted in one multi-issue request.
pub const MAX_ISSUES_PER_REQUEST: usize = 5;

/// Reject over-limit multi-issue requests explicitly rather than silently
/// truncating them.
pub fn ensure_issue_count(given: usize) -> Result<()> {
    if given == 0 {
        return Err(Error::Input(
            "supply a revision or at least one issue key".to_string(),
        ));
    }
    if given > MAX_ISSUES_PER_REQUEST {
        return Err(Error::TooManyIssues {
            given,
            max: MAX_ISSUES_PER_REQUEST,
        });
    }
    Ok(())
}

/// Resolves a target into its open per-file dependencies.
pub struct Resolver<'a> {
    history: &'a dyn RevisionLog,
    tracker: &'a dyn IssueTracker,
    config: &'a GateConfig,
    extractor: &'a KeyExtractor,
}

/// Intermediate output of target resolution: the scan bound, the target's
/// own key (absent when none could be extracted), and the candidate files.
struct ResolvedTarget {
    effective_revision: RevisionNumber,
    target_key: Option<IssueKey>,
    files: Vec<String>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over borrowed collaborators and configuration.
    #[must_use]
    pub fn new(
        history: &'a dyn RevisionLog,
        tracker: &'a dyn IssueTracker,
        config: &'a GateConfig,
        extractor: &'a KeyExtractor,
    ) -> Self {
        Self {
            history,
            tracker,
            config,
            extractor,
        }
    }

    /// Resolve `target` into a fresh [`ResolutionResult`].
    ///
    /// # Errors
    ///
    /// Collaborator failures are classified and re-raised, never silently
    /// discarded; see [`crate::error::Error`] for the taxonomy.
    pub async fn resolve(&self, target: &Target) -> Result<ResolutionResult> {
        let resolved = match target {
            Target::ByRevision(revision) => self.resolve_by_revision(*revision).await?,
            Target::ByIssue(key) => self.resolve_by_issue(key).await?,
        };

        tracing::debug!(
            effective_revision = %resolved.effective_revision,
            target_key = ?resolved.target_key,
            candidate_files = resolved.files.len(),
            "target resolved"
        );

        let mut files = Vec::with_capacity(resolved.files.len());
        for file in &resolved.files {
            files.push(
                self.scan_file(
                    file,
                    resolved.effective_revision,
                    resolved.target_key.as_ref(),
                )
                .await?,
            );
        }

        Ok(ResolutionResult {
            target_key: resolved.target_key,
            effective_revision: resolved.effective_revision,
            files,
        })
    }

    /// ByRevision mode: the audited revision's own changelist is the
    /// candidate set, and the revision itself is the scan bound.
    async fn resolve_by_revision(&self, revision: RevisionNumber) -> Result<ResolvedTarget> {
        let entry = self.history.entry(revision).await?;
        let target_key = self.extractor.primary(&entry.message);
        if target_key.is_none() {
            tracing::warn!(%revision, "no issue key in target message");
        }
        Ok(ResolvedTarget {
            effective_revision: revision,
            target_key,
            files: self.accepted_files(&entry.changed_paths),
        })
    }

    /// ByIssue mode: every commit referencing the issue since its creation
    /// contributes its changelist, and the newest such revision is the scan
    /// bound; the matched history may be older than unrelated recent
    /// activity on the same files.
    async fn resolve_by_issue(&self, key: &IssueKey) -> Result<ResolvedTarget> {
        let created = self.tracker.created(key).await?;
        let entries = self
            .history
            .search(created, key.as_str(), self.config.dev_branch())
            .await?;

        let mut effective_revision = RevisionNumber::default();
        let mut files: Vec<String> = Vec::new();
        for entry in &entries {
            effective_revision = effective_revision.max(entry.revision);
            for file in self.accepted_files(&entry.changed_paths) {
                if !files.contains(&file) {
                    files.push(file);
                }
            }
        }

        Ok(ResolvedTarget {
            effective_revision,
            target_key: Some(key.clone()),
            files,
        })
    }

    fn accepted_files(&self, paths: &[String]) -> Vec<String> {
        paths
            .iter()
            .filter(|p| self.config.accepts_extension(p))
            .cloned()
            .collect()
    }

    /// Scan one file's bounded history window for open dependencies.
    async fn scan_file(
        &self,
        file: &str,
        effective_revision: RevisionNumber,
        target_key: Option<&IssueKey>,
    ) -> Result<FileDependencySummary> {
        let mut records: Vec<DependencyRecord> = Vec::new();
        // Keys already resolved for this file, whatever the outcome: one
        // tracker query per distinct key.
        let mut seen: BTreeSet<IssueKey> = BTreeSet::new();
        let mut scanned = 0usize;

        let mut stream = self.history.file_history(file);
        while let Some(entry) = stream.next().await {
            let entry = entry?;
            if entry.revision > effective_revision {
                continue;
            }
            scanned += 1;

            let keys = self.extractor.extract(&entry.message);
            let same_change_set = target_key.is_some_and(|target| keys.contains(target));
            if !same_change_set {
                for key in keys {
                    if !seen.insert(key.clone()) {
                        continue;
                    }
                    let status = self.tracker.status(&key).await?;
                    if !self.config.is_ignored_status(&status) {
                        records.push(DependencyRecord { key, status });
                    }
                }
            }

            if scanned >= self.config.max_scan_depth() {
                break;
            }
        }

        tracing::debug!(file, scanned, open = records.len(), "file scanned");
        Ok(FileDependencySummary {
            file: file.to_string(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_count_must_be_positive_and_capped() {
        assert!(ensure_issue_count(0).is_err());
        assert!(ensure_issue_count(1).is_ok());
        assert!(ensure_issue_count(MAX_ISSUES_PER_REQUEST).is_ok());

        let err = ensure_issue_count(MAX_ISSUES_PER_REQUEST + 1).unwrap_err();
        assert!(matches!(err, Error::TooManyIssues { given: 6, .. }));
    }
}
