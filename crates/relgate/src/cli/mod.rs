//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a relgate project
//! - `check`: Audit a revision or issue for open dependencies
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! relgate init --pattern '[A-Z][A-Z0-9]*-[0-9]+'
//! relgate check --revision 4711
//! relgate check --issue PROJ-17 --json
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

// Re-export argument structs
pub use args::{CheckArgs, InitArgs};

// Re-export validators for external use
pub use validators::{validate_issue_key_arg, validate_pattern_arg};

/// Relgate - release-gate dependency auditing
///
/// Before promoting a change, relgate walks the bounded history of every
/// file it touches and reports issues that modified the same files and are
/// still unresolved in the tracker.
#[derive(Parser, Debug)]
#[command(name = "relgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a relgate project
    ///
    /// Creates the `.relgate/` directory with a default configuration.
    /// Run once, then edit the config to point at your working copy and
    /// tracker server.
    Init(InitArgs),

    /// Audit a revision or issue for open dependencies
    ///
    /// Resolves the target's candidate files and scans each file's bounded
    /// history for references to still-unresolved issues. Exits 2 when the
    /// gate is closed (any open dependency found).
    Check(CheckArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<ExitCode> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Commands::Init(args) => execute::execute_init(args).await,
            Commands::Check(args) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_check(&app, args, output_mode).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_requires_a_selector() {
        assert!(Cli::try_parse_from(["relgate", "check"]).is_err());
    }

    #[test]
    fn check_rejects_both_selectors() {
        let result = Cli::try_parse_from([
            "relgate", "check", "--revision", "100", "--issue", "PROJ-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn check_parses_revision_selector() {
        let cli = Cli::try_parse_from(["relgate", "check", "--revision", "100"]).unwrap();
        match cli.command {
            Commands::Check(args) => assert_eq!(args.revision.as_deref(), Some("100")),
            Commands::Init(_) => panic!("parsed wrong command"),
        }
    }

    #[test]
    fn check_parses_repeated_issue_keys() {
        let cli = Cli::try_parse_from([
            "relgate", "check", "--issue", "PROJ-1", "--issue", "PROJ-2",
        ])
        .unwrap();
        match cli.command {
            Commands::Check(args) => assert_eq!(args.issue, vec!["PROJ-1", "PROJ-2"]),
            Commands::Init(_) => panic!("parsed wrong command"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli =
            Cli::try_parse_from(["relgate", "check", "--revision", "100", "--json"]).unwrap();
        assert!(cli.json);
    }
}
