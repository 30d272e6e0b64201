//! Output formatting for CLI commands.
//!
//! Renders a [`ResolutionResult`] for the console in human-readable text or
//! JSON for programmatic use. The text form leads with the audited
//! revision, flags a null target key as an explicit warning (it is valid
//! resolver output, not an error), and closes with a severity summary
//! derived from "has any open dependency".

pub mod color;

use crate::domain::ResolutionResult;
use crate::error::Result;
use serde::Serialize;
use std::io::{self, Write};

pub use color::{error, info, success, warning, OutputConfig};

use color::dimmed;

/// Output format mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format.
    Text,
    /// JSON format for programmatic use.
    Json,
}

/// Render a resolution result as text into `w`.
pub fn render_result<W: Write>(
    w: &mut W,
    result: &ResolutionResult,
    config: &OutputConfig,
) -> io::Result<()> {
    let revision = format!("r{}", result.effective_revision);
    match &result.target_key {
        Some(key) => writeln!(
            w,
            "{} {} {} {}",
            dimmed("Audited", config),
            info(&revision, config),
            dimmed("target", config),
            info(key.as_str(), config),
        )?,
        None => {
            writeln!(w, "{} {}", dimmed("Audited", config), info(&revision, config))?;
            writeln!(
                w,
                "{}",
                warning(
                    "No issue key found in the target change; shared-history \
                     references cannot be excluded as same-change",
                    config
                )
            )?;
        }
    }
    writeln!(w)?;

    if result.files.is_empty() {
        writeln!(w, "{}", dimmed("No auditable files in this change.", config))?;
        return Ok(());
    }

    for file in &result.files {
        if file.is_clean() {
            writeln!(w, "  {}  {}", file.file, success("OK", config))?;
        } else {
            writeln!(w, "  {}", file.file)?;
            for record in &file.records {
                writeln!(
                    w,
                    "    {}  {}",
                    info(record.key.as_str(), config),
                    error(record.status.as_str(), config),
                )?;
            }
        }
    }
    writeln!(w)?;

    let open: usize = result.files.iter().map(|f| f.records.len()).sum();
    if open == 0 {
        writeln!(w, "{}", success("No open dependencies.", config))?;
    } else {
        let blocked = result.files.iter().filter(|f| !f.is_clean()).count();
        writeln!(
            w,
            "{}",
            error(
                &format!(
                    "{open} open {} across {blocked} {}.",
                    plural(open, "dependency", "dependencies"),
                    plural(blocked, "file", "files"),
                ),
                config
            )
        )?;
    }
    Ok(())
}

/// Print a resolution result as text to stdout.
pub fn print_result(result: &ResolutionResult, config: &OutputConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    render_result(&mut handle, result, config)?;
    Ok(())
}

/// Print any serializable value as pretty JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).map_err(io::Error::other)?;
    writeln!(handle)?;
    Ok(())
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DependencyRecord, FileDependencySummary, IssueKey, IssueStatus, RevisionNumber,
    };

    fn render(result: &ResolutionResult) -> String {
        let mut buf = Vec::new();
        render_result(&mut buf, result, &OutputConfig::new(false)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn result_with(records: Vec<DependencyRecord>) -> ResolutionResult {
        ResolutionResult {
            target_key: Some(IssueKey::new("PROJ-1")),
            effective_revision: RevisionNumber::new(100),
            files: vec![FileDependencySummary {
                file: "a.cpp".to_string(),
                records,
            }],
        }
    }

    #[test]
    fn clean_files_render_ok() {
        let text = render(&result_with(vec![]));
        assert!(text.contains("Audited r100 target PROJ-1"));
        assert!(text.contains("a.cpp  OK"));
        assert!(text.contains("No open dependencies."));
    }

    #[test]
    fn open_records_render_with_severity_summary() {
        let text = render(&result_with(vec![
            DependencyRecord {
                key: IssueKey::new("PROJ-2"),
                status: IssueStatus::new("Open"),
            },
            DependencyRecord {
                key: IssueKey::new("PROJ-3"),
                status: IssueStatus::new("In Review"),
            },
        ]));
        assert!(text.contains("PROJ-2  Open"));
        assert!(text.contains("PROJ-3  In Review"));
        assert!(text.contains("2 open dependencies across 1 file."));
    }

    #[test]
    fn null_target_renders_a_warning_not_an_error() {
        let result = ResolutionResult {
            target_key: None,
            effective_revision: RevisionNumber::new(42),
            files: vec![],
        };
        let text = render(&result);
        assert!(text.contains("Audited r42"));
        assert!(text.contains("No issue key found"));
        assert!(text.contains("No auditable files"));
    }
}
