//! Application context for CLI command execution.
//!
//! The `App` struct is the composition root: it loads configuration,
//! acquires the tracker credential from the environment, and constructs
//! the collaborator clients the resolver borrows. The core never touches
//! ambient state itself.

use crate::commands::init::{find_gate_root, GateConfig, CONFIG_FILE_NAME, GATE_DIR_NAME};
use crate::error::{Error, Result};
use crate::extract::KeyExtractor;
use crate::history::{svn::SvnLog, RevisionLog};
use crate::resolver::Resolver;
use crate::tracker::{jira::JiraClient, IssueTracker};
use std::path::Path;

/// Environment variable carrying the tracker personal access token.
pub const TRACKER_TOKEN_ENV: &str = "RELGATE_JIRA_TOKEN";

/// Application context for CLI operations.
pub struct App {
    config: GateConfig,
    extractor: KeyExtractor,
    history: Box<dyn RevisionLog>,
    tracker: Box<dyn IssueTracker>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("history", &"<dyn RevisionLog>")
            .field("tracker", &"<dyn IssueTracker>")
            .finish()
    }
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree for a `.relgate/` directory, loads
    /// configuration, reads the tracker token from `RELGATE_JIRA_TOKEN`,
    /// and wires up the Subversion and Jira clients.
    ///
    /// # Errors
    ///
    /// Returns an error if no relgate project is found, configuration
    /// cannot be loaded, or the token variable is unset.
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_gate_root(working_dir).ok_or_else(|| {
            Error::Config("not a relgate project (run `relgate init` first)".to_string())
        })?;

        let config_path = root_dir.join(GATE_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = GateConfig::load(&config_path).await?;

        let token = std::env::var(TRACKER_TOKEN_ENV).map_err(|_| {
            Error::Config(format!(
                "{TRACKER_TOKEN_ENV} is not set; export a tracker personal access token"
            ))
        })?;

        let working_copy = root_dir.join(&config.history.working_copy);
        let history: Box<dyn RevisionLog> = Box::new(SvnLog::new(working_copy));
        let tracker: Box<dyn IssueTracker> =
            Box::new(JiraClient::new(config.tracker.server.as_str(), token));

        Self::with_collaborators(config, history, tracker)
    }

    /// Create an App over explicit collaborators.
    ///
    /// This is the seam for embedding and for tests: any [`RevisionLog`]
    /// and [`IssueTracker`] pair works, including the in-memory
    /// implementations.
    pub fn with_collaborators(
        config: GateConfig,
        history: Box<dyn RevisionLog>,
        tracker: Box<dyn IssueTracker>,
    ) -> Result<Self> {
        config.validate()?;
        let extractor = KeyExtractor::new(&config.issue_pattern)?;
        Ok(Self {
            config,
            extractor,
            history,
            tracker,
        })
    }

    /// A resolver borrowing this App's collaborators and configuration.
    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(
            self.history.as_ref(),
            self.tracker.as_ref(),
            &self.config,
            &self.extractor,
        )
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use crate::history::in_memory::InMemoryHistory;
    use crate::tracker::in_memory::StaticTracker;
    use tempfile::TempDir;

    fn in_memory_app(config: GateConfig) -> Result<App> {
        App::with_collaborators(
            config,
            Box::new(InMemoryHistory::new()),
            Box::new(StaticTracker::new()),
        )
    }

    #[test]
    fn with_collaborators_validates_config() {
        let mut config = GateConfig::default();
        config.issue_pattern = "[A-Z".to_string();
        assert!(in_memory_app(config).is_err());

        assert!(in_memory_app(GateConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn from_directory_requires_initialization() {
        let temp_dir = TempDir::new().unwrap();

        let result = App::from_directory(temp_dir.path()).await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("not a relgate project"));
    }

    #[tokio::test]
    async fn from_directory_requires_token() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None).await.unwrap();

        // The token variable is deliberately not set for tests.
        if std::env::var(TRACKER_TOKEN_ENV).is_ok() {
            return;
        }
        let result = App::from_directory(temp_dir.path()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains(TRACKER_TOKEN_ENV));
    }
}
