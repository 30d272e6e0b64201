//! Jira REST client.
//!
//! Queries Jira's REST v2 API for the two fields the resolver needs:
//! current status and creation timestamp. Authentication uses a personal
//! access token as a bearer header; acquiring and storing the token is the
//! composition root's concern, this client only carries it.
//!
//! `ureq` is a blocking client, so calls are bridged into the async trait
//! with `spawn_blocking`. Connect and read timeouts are set on the agent;
//! expiry surfaces as `Error::Transport` rather than hanging a resolution.

use super::IssueTracker;
use crate::domain::{IssueKey, IssueStatus};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Connect timeout for tracker calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read timeout for tracker calls.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// [`IssueTracker`] implementation over the Jira REST v2 API.
#[derive(Clone)]
pub struct JiraClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Response shape of `GET /rest/api/2/issue/{key}?fields=status,created`.
#[derive(Debug, Deserialize)]
struct IssueResponse {
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    status: StatusField,
    created: String,
}

#[derive(Debug, Deserialize)]
struct StatusField {
    name: String,
}

impl JiraClient {
    /// Create a client for the given server, authenticated with a personal
    /// access token.
    #[must_use]
    pub fn new(server: impl Into<String>, token: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self {
            agent,
            base_url: server.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn issue_url(&self, key: &IssueKey) -> String {
        format!(
            "{}/rest/api/2/issue/{}?fields=status,created",
            self.base_url, key
        )
    }

    /// Fetch status and creation fields for one issue.
    async fn fields(&self, key: &IssueKey) -> Result<IssueFields> {
        let agent = self.agent.clone();
        let url = self.issue_url(key);
        let token = self.token.clone();
        let key = key.clone();

        tracing::debug!(%key, "querying tracker");
        tokio::task::spawn_blocking(move || {
            let response = agent
                .get(&url)
                .set("Accept", "application/json")
                .set("Authorization", &format!("Bearer {token}"))
                .call();

            match response {
                Ok(resp) => resp
                    .into_json::<IssueResponse>()
                    .map(|r| r.fields)
                    .map_err(|e| Error::Tracker {
                        key: key.clone(),
                        reason: format!("malformed tracker response: {e}"),
                    }),
                Err(ureq::Error::Status(404, _)) => Err(Error::IssueNotFound(key.clone())),
                Err(ureq::Error::Status(code, _)) => Err(Error::Tracker {
                    key: key.clone(),
                    reason: format!("tracker returned HTTP {code}"),
                }),
                Err(ureq::Error::Transport(t)) => Err(Error::Transport(t.to_string())),
            }
        })
        .await
        .map_err(|e| Error::Transport(format!("tracker call did not complete: {e}")))?
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn status(&self, key: &IssueKey) -> Result<IssueStatus> {
        let fields = self.fields(key).await?;
        Ok(IssueStatus::new(fields.status.name))
    }

    async fn created(&self, key: &IssueKey) -> Result<DateTime<Utc>> {
        let fields = self.fields(key).await?;
        parse_created(&fields.created).ok_or_else(|| Error::Tracker {
            key: key.clone(),
            reason: format!("unparseable creation timestamp '{}'", fields.created),
        })
    }
}

/// Parse Jira's creation timestamp.
///
/// Jira reports `2024-05-01T10:22:33.000+0200`; some deployments emit a
/// colon in the offset, which is plain RFC 3339.
fn parse_created(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn issue_url_includes_fields_filter() {
        let client = JiraClient::new("https://jira.example.com/", "secret");
        assert_eq!(
            client.issue_url(&IssueKey::new("PROJ-1")),
            "https://jira.example.com/rest/api/2/issue/PROJ-1?fields=status,created"
        );
    }

    #[test]
    fn parses_jira_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 22, 33).unwrap();
        assert_eq!(
            parse_created("2024-05-01T10:22:33.000+0200").unwrap(),
            expected
        );
        assert_eq!(
            parse_created("2024-05-01T10:22:33+02:00").unwrap(),
            expected
        );
        assert!(parse_created("yesterday-ish").is_none());
    }

    #[test]
    fn deserializes_issue_response() {
        let body = r#"{
            "key": "PROJ-1",
            "fields": {
                "status": { "name": "In Review", "id": "3" },
                "created": "2024-05-01T10:22:33.000+0200"
            }
        }"#;
        let parsed: IssueResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.fields.status.name, "In Review");
    }
}
