//! Validation functions for CLI arguments.
//!
//! These run during argument parsing so that malformed input fails with a
//! clap-rendered message before any collaborator is contacted.

use regex::Regex;

/// Validate an issue-key pattern argument.
pub fn validate_pattern_arg(pattern: &str) -> Result<String, String> {
    Regex::new(pattern).map_err(|e| format!("invalid issue-key pattern: {e}"))?;
    Ok(pattern.to_string())
}

/// Validate an issue-key argument.
///
/// Keys are normalized later; here we only reject shapes that cannot be a
/// key at all.
pub fn validate_issue_key_arg(key: &str) -> Result<String, String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err("issue key must not be empty".to_string());
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(format!("issue key must not contain whitespace: '{key}'"));
    }
    Ok(trimmed.to_string())
}
