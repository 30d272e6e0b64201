//! Issue-key extraction from free-text commit messages.

use crate::domain::IssueKey;
use crate::error::{Error, Result};
use regex::Regex;

/// Pulls issue keys out of free text via a configured pattern.
///
/// Matching is case-normalized system-wide: input text is uppercased before
/// the pattern runs, so patterns are written against uppercase keys
/// (e.g. `[A-Z][A-Z0-9]*-[0-9]+`). Extraction is deterministic and returns
/// distinct keys in first-occurrence order; the order is load-bearing, since
/// the first key in a target message is its primary key.
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    pattern: Regex,
}

impl KeyExtractor {
    /// Compile an extractor from the configured pattern.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the pattern is not a valid regular
    /// expression.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid issue-key pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// All distinct issue keys in `text`, in first-occurrence order.
    ///
    /// Returns an empty vector when no pattern occurrence exists.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<IssueKey> {
        let upper = text.to_uppercase();
        let mut keys: Vec<IssueKey> = Vec::new();
        for found in self.pattern.find_iter(&upper) {
            let key = IssueKey::new(found.as_str());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// The primary issue key of `text`: the first distinct match, if any.
    ///
    /// A message with no key is valid input; callers treat `None` as
    /// "no dependency tracking possible for this target", never as an error.
    #[must_use]
    pub fn primary(&self, text: &str) -> Option<IssueKey> {
        self.extract(text).into_iter().next()
    }
}
