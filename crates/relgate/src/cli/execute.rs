//! Command execution logic.

use anyhow::Result;

use super::args::{CheckArgs, InitArgs};
use crate::app::App;
use crate::domain::{IssueKey, RevisionNumber, Target};
use crate::error::Error;
use crate::output::{self, OutputConfig, OutputMode};
use crate::resolver;
use std::process::ExitCode;

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<ExitCode> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.pattern.as_deref()).await?;

    if !args.quiet {
        println!("Initialized relgate in {}", result.gate_dir.display());
        println!("  Config: {}", result.config_file.display());
        println!("  Issue pattern: {}", result.pattern);
        println!();
        println!(
            "Edit the config to point at your working copy and tracker, then \
             export {} before running checks.",
            crate::app::TRACKER_TOKEN_ENV
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Execute the check command.
///
/// Exit code policy: 0 when every audited file is clean, 1 on a handled
/// error, 2 when any open dependency was found (the gate is closed).
pub async fn execute_check(
    app: &App,
    args: &CheckArgs,
    output_mode: OutputMode,
) -> Result<ExitCode> {
    let targets = match build_targets(args) {
        Ok(targets) => targets,
        Err(e) => return handled(e),
    };

    let output_config = OutputConfig::from_env();
    let mut any_open = false;

    for target in &targets {
        let result = match app.resolver().resolve(target).await {
            Ok(result) => result,
            Err(e) => return handled(e),
        };

        any_open |= result.has_open_dependencies();
        match output_mode {
            OutputMode::Json => output::print_json(&result)?,
            OutputMode::Text => output::print_result(&result, &output_config)?,
        }
    }

    Ok(if any_open {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

/// Turn the parsed selector into resolution targets, enforcing the
/// multi-issue cap.
fn build_targets(args: &CheckArgs) -> crate::error::Result<Vec<Target>> {
    if let Some(revision) = &args.revision {
        let revision: RevisionNumber = revision.parse()?;
        return Ok(vec![Target::ByRevision(revision)]);
    }

    resolver::ensure_issue_count(args.issue.len())?;
    Ok(args
        .issue
        .iter()
        .map(|key| Target::ByIssue(IssueKey::new(key.as_str())))
        .collect())
}

/// Map a classified error to a short user message, or re-raise kinds the
/// caller-facing layer does not recognize.
fn handled(err: Error) -> Result<ExitCode> {
    let message = match &err {
        Error::Input(msg) => msg.clone(),
        Error::TooManyIssues { given, max } => {
            format!("Too many issue keys ({given}); check at most {max} per run")
        }
        Error::RevisionNotFound(revision) => format!("No such revision: r{revision}"),
        Error::IssueNotFound(key) => format!("No such issue: {key}"),
        Error::HistoryUnavailable { path } => {
            format!("History unavailable for '{path}' (renamed or deleted?)")
        }
        // Transport, tracker, config, and IO failures carry context worth
        // keeping; re-raise instead of shortening.
        _ => return Err(err.into()),
    };

    eprintln!("{message}");
    Ok(ExitCode::FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn check_args(argv: &[&str]) -> CheckArgs {
        CheckArgs::try_parse_from(argv.iter().copied()).unwrap()
    }

    #[test]
    fn revision_selector_builds_one_target() {
        let args = check_args(&["check", "--revision", "r100"]);
        let targets = build_targets(&args).unwrap();
        assert_eq!(targets, vec![Target::ByRevision(RevisionNumber::new(100))]);
    }

    #[test]
    fn issue_selector_normalizes_keys() {
        let args = check_args(&["check", "--issue", "proj-1,proj-2"]);
        let targets = build_targets(&args).unwrap();
        assert_eq!(
            targets,
            vec![
                Target::ByIssue(IssueKey::new("PROJ-1")),
                Target::ByIssue(IssueKey::new("PROJ-2")),
            ]
        );
    }

    #[test]
    fn unparseable_revision_is_an_input_error() {
        let args = check_args(&["check", "--revision", "abc"]);
        assert!(matches!(build_targets(&args), Err(Error::Input(_))));
    }

    #[test]
    fn over_limit_issue_list_is_rejected() {
        let args = check_args(&[
            "check", "--issue", "A-1,A-2,A-3,A-4,A-5,A-6",
        ]);
        assert!(matches!(
            build_targets(&args),
            Err(Error::TooManyIssues { given: 6, .. })
        ));
    }
}
