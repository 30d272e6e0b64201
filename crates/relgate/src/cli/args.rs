//! CLI argument structs for all commands.

use clap::{ArgGroup, Parser};

use super::validators::{validate_issue_key_arg, validate_pattern_arg};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Issue-key pattern used to extract keys from commit messages
    ///
    /// Written against uppercased text, e.g. `[A-Z][A-Z0-9]*-[0-9]+`.
    #[arg(short, long, value_parser = validate_pattern_arg)]
    pub pattern: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `check` command
///
/// Exactly one selector kind is required: a revision number, or one or
/// more issue keys.
#[derive(Parser, Debug, Clone)]
#[command(group(
    ArgGroup::new("selector")
        .required(true)
        .args(["revision", "issue"])
))]
pub struct CheckArgs {
    /// Revision number to audit (e.g. 4711 or r4711)
    #[arg(short, long)]
    pub revision: Option<String>,

    /// Issue key(s) to audit (repeatable or comma-separated)
    #[arg(short, long, value_delimiter = ',', value_parser = validate_issue_key_arg)]
    pub issue: Vec<String>,
}
