//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Clean/OK:       green  (files with no open dependencies)
//!   - Blocking:       red    (open dependency records, severity summary)
//!   - Warning:        yellow (null target key, degraded tracking)
//!   - Info/Reference: cyan   (issue keys, revision numbers)
//!   - Muted:          dimmed (field labels)

use colored::Colorize;
use std::env;

/// Configuration for output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an OutputConfig with explicit values.
    #[must_use]
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `NO_COLOR`: standard env var to disable colors (any value disables)
    /// - `RELGATE_COLOR`: set to "0" or "false" to disable colors
    #[must_use]
    pub fn from_env() -> Self {
        // Respect the NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("RELGATE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);
        Self { use_colors }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Dim a field label.
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_colors_pass_text_through() {
        let config = OutputConfig::new(false);
        assert_eq!(success("OK", &config), "OK");
        assert_eq!(error("Open", &config), "Open");
        assert_eq!(warning("warn", &config), "warn");
        assert_eq!(info("PROJ-1", &config), "PROJ-1");
        assert_eq!(dimmed("label", &config), "label");
    }
}
