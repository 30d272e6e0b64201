//! Subversion-backed revision history.
//!
//! [`SvnLog`] drives the `svn log -v` CLI against a working copy and parses
//! its plain output. The format is fixed: a dashed separator line, then a
//! header of the form
//!
//! ```text
//! r123 | alice | 2024-05-01 12:34:56 +0000 (Wed, 01 May 2024) | 2 lines
//! ```
//!
//! followed by an optional `Changed paths:` block and exactly the announced
//! number of message lines. The line count removes any ambiguity from
//! dashes inside commit messages.
//!
//! Per-file history spawns a dedicated `svn log` process and parses entries
//! incrementally off its stdout, so the resolver's bounded scan never forces
//! the full history through the pipe; the child is killed when the stream is
//! dropped early.

use crate::domain::{LogEntry, RevisionNumber};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;

use super::RevisionLog;

/// Overall timeout for a collected `svn log` invocation.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for producing the next entry of a streamed invocation.
const ENTRY_TIMEOUT: Duration = Duration::from_secs(30);

fn timed_out() -> Error {
    Error::Transport("svn log timed out".to_string())
}

/// [`RevisionLog`] implementation over a Subversion working copy.
#[derive(Debug, Clone)]
pub struct SvnLog {
    working_copy: PathBuf,
}

impl SvnLog {
    /// Create a history source rooted at the given working copy.
    #[must_use]
    pub fn new(working_copy: impl Into<PathBuf>) -> Self {
        Self {
            working_copy: working_copy.into(),
        }
    }

    /// Base `svn log -v` invocation; callers add range/target arguments.
    fn command(&self) -> Command {
        let mut cmd = Command::new("svn");
        cmd.arg("log")
            .arg("-v")
            .arg("--non-interactive")
            .current_dir(&self.working_copy)
            .stdin(Stdio::null());
        cmd
    }

    /// Run an invocation to completion and parse every entry it printed.
    async fn run_collected(&self, cmd: &mut Command) -> Result<ParsedOutput> {
        let output = timeout(COMMAND_TIMEOUT, cmd.output())
            .await
            .map_err(|_| timed_out())?
            .map_err(map_spawn_error)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Ok(ParsedOutput {
                entries: Vec::new(),
                failure: Some(stderr),
            });
        }

        let mut reader = EntryReader::new(output.stdout.as_slice());
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await {
            entries.push(entry?);
        }
        Ok(ParsedOutput {
            entries,
            failure: None,
        })
    }
}

/// Entries plus the raw stderr of a failed invocation, for the caller to
/// classify with the context it has (revision vs. path vs. search).
struct ParsedOutput {
    entries: Vec<LogEntry>,
    failure: Option<String>,
}

#[async_trait]
impl RevisionLog for SvnLog {
    async fn entry(&self, revision: RevisionNumber) -> Result<LogEntry> {
        let mut cmd = self.command();
        cmd.arg("-r")
            .arg(revision.to_string())
            .arg("--limit")
            .arg("1");

        let parsed = self.run_collected(&mut cmd).await?;
        if let Some(stderr) = parsed.failure {
            if stderr.contains("No such revision") {
                return Err(Error::RevisionNotFound(revision));
            }
            return Err(Error::Transport(first_line(&stderr)));
        }
        parsed
            .entries
            .into_iter()
            .find(|e| e.revision == revision)
            .ok_or(Error::RevisionNotFound(revision))
    }

    fn file_history(&self, path: &str) -> BoxStream<'_, Result<LogEntry>> {
        let mut cmd = self.command();
        cmd.arg("--")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn().map_err(map_spawn_error) {
            Ok(child) => child,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };
        let Some(stdout) = child.stdout.take() else {
            return stream::once(async {
                Err(Error::Transport("svn stdout unavailable".to_string()))
            })
            .boxed();
        };

        let state = HistoryStream {
            reader: EntryReader::new(stdout),
            child,
            path: path.to_string(),
            done: false,
        };
        stream::unfold(state, |mut state| async move {
            state.next().await.map(|item| (item, state))
        })
        .boxed()
    }

    async fn search(
        &self,
        since: DateTime<Utc>,
        term: &str,
        branch: Option<&str>,
    ) -> Result<Vec<LogEntry>> {
        let mut cmd = self.command();
        let range = format!("{{{}}}:HEAD", since.format("%Y-%m-%dT%H:%M:%SZ"));
        cmd.arg("-r").arg(range).arg("--search").arg(term);
        if let Some(branch) = branch {
            cmd.arg("--").arg(branch);
        }

        let parsed = self.run_collected(&mut cmd).await?;
        if let Some(stderr) = parsed.failure {
            return Err(Error::Transport(first_line(&stderr)));
        }

        // `svn log --search` also matches authors and paths; keep only
        // entries whose message carries the term, and re-check the time
        // bound since date ranges resolve at server granularity.
        let term = term.to_uppercase();
        Ok(parsed
            .entries
            .into_iter()
            .filter(|e| e.message.to_uppercase().contains(&term))
            .filter(|e| e.timestamp >= since)
            .collect())
    }
}

/// Incremental stream state over a running `svn log` child process.
struct HistoryStream {
    reader: EntryReader<ChildStdout>,
    child: Child,
    path: String,
    done: bool,
}

impl HistoryStream {
    async fn next(&mut self) -> Option<Result<LogEntry>> {
        if self.done {
            return None;
        }
        let next = match timeout(ENTRY_TIMEOUT, self.reader.next_entry()).await {
            Ok(next) => next,
            Err(_) => {
                self.done = true;
                return Some(Err(timed_out()));
            }
        };
        if let Some(item) = next {
            if item.is_err() {
                self.done = true;
            }
            return Some(item);
        }
        // Stdout is drained; the exit status decides between a clean end
        // of history and a classified failure.
        self.done = true;
        match self.finish().await {
            Ok(()) => None,
            Err(e) => Some(Err(e)),
        }
    }

    async fn finish(&mut self) -> Result<()> {
        let status = timeout(COMMAND_TIMEOUT, self.child.wait())
            .await
            .map_err(|_| timed_out())??;
        if status.success() {
            return Ok(());
        }
        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr).await;
        }
        Err(classify_path_failure(&self.path, &stderr))
    }
}

/// Parses `svn log -v` plain output entry by entry.
struct EntryReader<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> EntryReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }

    /// The next complete entry, or `None` at end of output.
    async fn next_entry(&mut self) -> Option<Result<LogEntry>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => return Some(Err(e.into())),
            };
            if !is_separator(&line) {
                continue;
            }
            let header = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                // Trailing separator at end of output.
                Ok(None) => return None,
                Err(e) => return Some(Err(e.into())),
            };
            if header.is_empty() {
                continue;
            }
            return Some(self.read_entry(&header).await);
        }
    }

    async fn read_entry(&mut self, header: &str) -> Result<LogEntry> {
        let (revision, timestamp, message_lines) = parse_header(header)?;

        let mut changed_paths = Vec::new();
        if let Some(line) = self.lines.next_line().await? {
            if line.trim_end() == "Changed paths:" {
                // Path lines run until the blank line before the message.
                while let Some(path_line) = self.lines.next_line().await? {
                    if path_line.is_empty() {
                        break;
                    }
                    if let Some(path) = parse_changed_path(&path_line) {
                        changed_paths.push(path);
                    }
                }
            }
        }

        // The header announced the exact message length; reading that many
        // lines keeps dashed lines inside messages from looking like entry
        // separators.
        let mut message = Vec::with_capacity(message_lines);
        for _ in 0..message_lines {
            message.push(self.lines.next_line().await?.unwrap_or_default());
        }

        Ok(LogEntry {
            revision,
            message: message.join("\n"),
            timestamp,
            changed_paths,
        })
    }
}

/// Entry separator: a line of dashes (svn prints 72 of them).
fn is_separator(line: &str) -> bool {
    line.len() >= 8 && line.bytes().all(|b| b == b'-')
}

/// Parse `r123 | author | date (weekday) | N lines` into its load-bearing
/// parts.
fn parse_header(line: &str) -> Result<(RevisionNumber, DateTime<Utc>, usize)> {
    let malformed = || {
        Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("malformed svn log header: '{line}'"),
        ))
    };

    let parts: Vec<&str> = line.split(" | ").collect();
    if parts.len() < 4 {
        return Err(malformed());
    }

    let revision = parts[0]
        .strip_prefix('r')
        .and_then(|digits| digits.parse::<u64>().ok())
        .map(RevisionNumber::new)
        .ok_or_else(malformed)?;

    // Drop the parenthesized human-readable date.
    let date_text = parts[2].split(" (").next().unwrap_or(parts[2]).trim();
    let timestamp = DateTime::parse_from_str(date_text, "%Y-%m-%d %H:%M:%S %z")
        .map_err(|_| malformed())?
        .with_timezone(&Utc);

    let message_lines = parts[parts.len() - 1]
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(malformed)?;

    Ok((revision, timestamp, message_lines))
}

/// Parse a changed-path line like `   M /trunk/a.cpp` or
/// `   A /b.cpp (from /a.cpp:12)`.
fn parse_changed_path(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let (_action, rest) = trimmed.split_once(' ')?;
    let mut path = rest.trim();
    if path.ends_with(')') {
        if let Some(at) = path.rfind(" (from ") {
            path = path[..at].trim_end();
        }
    }
    (!path.is_empty()).then(|| path.to_string())
}

fn map_spawn_error(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::Transport("svn executable not found on PATH".to_string())
    } else {
        Error::Io(e)
    }
}

fn classify_path_failure(path: &str, stderr: &str) -> Error {
    let lowered = stderr.to_lowercase();
    let vanished = lowered.contains("path not found")
        || lowered.contains("non-existent")
        || lowered.contains("e200009")
        || lowered.contains("e160013");
    if vanished {
        Error::HistoryUnavailable {
            path: path.to_string(),
        }
    } else {
        Error::Transport(first_line(stderr))
    }
}

/// First non-empty stderr line, for short user-facing transport messages.
fn first_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("svn log failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE_LOG: &str = "\
------------------------------------------------------------------------
r100 | alice | 2024-05-01 12:34:56 +0000 (Wed, 01 May 2024) | 1 line
Changed paths:
   M /trunk/src/a.cpp
   A /trunk/src/b.h (from /trunk/src/old.h:90)

PROJ-1 fix
------------------------------------------------------------------------
r99 | bob | 2024-04-30 09:00:00 +0000 (Tue, 30 Apr 2024) | 3 lines
Changed paths:
   M /trunk/src/a.cpp

PROJ-1 wip
----------------
still the same message
------------------------------------------------------------------------
";

    async fn parse_all(text: &str) -> Vec<LogEntry> {
        let mut reader = EntryReader::new(text.as_bytes());
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await {
            entries.push(entry.unwrap());
        }
        entries
    }

    #[tokio::test]
    async fn parses_entries_with_changelists() {
        let entries = parse_all(SAMPLE_LOG).await;
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].revision, RevisionNumber::new(100));
        assert_eq!(entries[0].message, "PROJ-1 fix");
        assert_eq!(
            entries[0].timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 56).unwrap()
        );
        // Copy-from metadata is stripped from the path.
        assert_eq!(
            entries[0].changed_paths,
            vec!["/trunk/src/a.cpp", "/trunk/src/b.h"]
        );
    }

    #[tokio::test]
    async fn dashed_lines_inside_messages_do_not_split_entries() {
        let entries = parse_all(SAMPLE_LOG).await;
        assert_eq!(
            entries[1].message,
            "PROJ-1 wip\n----------------\nstill the same message"
        );
    }

    #[tokio::test]
    async fn empty_output_yields_no_entries() {
        assert!(parse_all("").await.is_empty());
        // A log with no matching entries is a lone separator.
        let lone = "------------------------------------------------------------------------\n";
        assert!(parse_all(lone).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_header_is_an_error() {
        let bad = "\
------------------------------------------------------------------------
not a header at all | 2 lines
";
        let mut reader = EntryReader::new(bad.as_bytes());
        let first = reader.next_entry().await.unwrap();
        assert!(first.is_err());
    }

    #[test]
    fn header_parses_timezone_offsets() {
        let (rev, ts, lines) =
            parse_header("r7 | carol | 2024-05-01 14:34:56 +0200 (Wed, 01 May 2024) | 2 lines")
                .unwrap();
        assert_eq!(rev, RevisionNumber::new(7));
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 56).unwrap());
        assert_eq!(lines, 2);
    }

    #[test]
    fn changed_path_line_variants() {
        assert_eq!(
            parse_changed_path("   M /trunk/a.cpp"),
            Some("/trunk/a.cpp".to_string())
        );
        assert_eq!(
            parse_changed_path("   A /b.cpp (from /a.cpp:12)"),
            Some("/b.cpp".to_string())
        );
        assert_eq!(parse_changed_path(""), None);
    }

    #[test]
    fn path_failures_classify_as_history_unavailable() {
        let err = classify_path_failure(
            "src/gone.cpp",
            "svn: E200009: Could not list all targets because some targets don't exist\n\
             svn: E200009: Illegal target for the requested operation",
        );
        assert!(matches!(err, Error::HistoryUnavailable { path } if path == "src/gone.cpp"));

        let err = classify_path_failure("src/a.cpp", "svn: E170013: Unable to connect");
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn separator_detection_requires_a_dash_run() {
        assert!(is_separator(
            "------------------------------------------------------------------------"
        ));
        assert!(!is_separator("-- not a separator --"));
        assert!(!is_separator(""));
    }
}
