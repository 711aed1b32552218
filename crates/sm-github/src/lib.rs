//! GitHub activity feed client for the push streak monitor.
//!
//! Reads a user's public event feed (`GET /users/{username}/events`) one page
//! at a time and converts the records into [`sm_core::Event`]s.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use sm_core::{ActivitySource, Event, EventKind, UNKNOWN_REPO};

/// Per-request timeout for page fetches.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Public GitHub REST API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("streak-monitor/", env!("CARGO_PKG_VERSION"));

/// GitHub client errors.
#[derive(Debug, Error)]
pub enum GithubError {
    /// A required credential was empty.
    #[error("invalid {field}: {reason}")]
    InvalidCredential {
        field: &'static str,
        reason: &'static str,
    },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed (connection, timeout, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Client for one user's event feed.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    username: String,
    token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client against the public GitHub API.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Result<Self, GithubError> {
        Self::with_base_url(GITHUB_API_URL, username, token)
    }

    /// Creates a client against a specific API root (GitHub Enterprise, tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the username or token is empty or whitespace-only,
    /// or if the HTTP client fails to build.
    pub fn with_base_url(
        base_url: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, GithubError> {
        let username = username.into();
        let token = token.into();
        require_non_blank("username", &username)?;
        require_non_blank("token", &token)?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(GithubError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username,
            token,
        })
    }

    pub fn events_url(&self) -> String {
        format!("{}/users/{}/events", self.base_url, self.username)
    }

    /// Fetches a single page of the user's events, newest first.
    pub async fn events_page(&self, page: u32, per_page: u32) -> Result<Vec<Event>, GithubError> {
        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GithubError::Api {
                status: status.as_u16(),
                message: parse_api_message(&body).unwrap_or(body),
            });
        }

        let events = parse_events(&body)?;
        tracing::debug!(page, count = events.len(), "received events page");
        Ok(events)
    }
}

impl ActivitySource for Client {
    type Error = GithubError;

    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<Event>, GithubError> {
        self.events_page(page, per_page).await
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), GithubError> {
    if value.is_empty() {
        return Err(GithubError::InvalidCredential {
            field,
            reason: "cannot be empty",
        });
    }
    if value.trim().is_empty() {
        return Err(GithubError::InvalidCredential {
            field,
            reason: "cannot be whitespace-only",
        });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type", default)]
    kind: Option<EventKind>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    repo: Option<WireRepo>,
}

#[derive(Debug, Deserialize)]
struct WireRepo {
    #[serde(default)]
    name: Option<String>,
}

impl From<WireEvent> for Event {
    fn from(wire: WireEvent) -> Self {
        let repo = wire
            .repo
            .and_then(|repo| repo.name)
            .unwrap_or_else(|| UNKNOWN_REPO.to_string());
        Self {
            kind: wire.kind.unwrap_or_else(|| EventKind::Other(String::new())),
            timestamp: wire.created_at,
            repo,
        }
    }
}

fn parse_events(body: &str) -> Result<Vec<Event>, GithubError> {
    let wire: Vec<WireEvent> =
        serde_json::from_str(body).map_err(|err| GithubError::InvalidResponse(err.to_string()))?;
    Ok(wire.into_iter().map(Event::from).collect())
}

fn parse_api_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| payload.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_rejects_empty_token() {
        assert!(matches!(
            Client::new("octocat", ""),
            Err(GithubError::InvalidCredential { field: "token", .. })
        ));
    }

    #[test]
    fn client_rejects_whitespace_username() {
        assert!(matches!(
            Client::new("   ", "ghp_token"),
            Err(GithubError::InvalidCredential {
                field: "username",
                ..
            })
        ));
    }

    #[test]
    fn client_debug_redacts_token() {
        let client = Client::new("octocat", "ghp_secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn events_url_trims_trailing_slash() {
        let client = Client::with_base_url("http://localhost:8080/", "octocat", "t").unwrap();
        assert_eq!(client.events_url(), "http://localhost:8080/users/octocat/events");
    }

    #[test]
    fn parse_events_maps_wire_fields() {
        let body = r#"[
            {"id":"1","type":"PushEvent","created_at":"2025-12-06T01:30:00Z","repo":{"id":7,"name":"octocat/streak"}},
            {"id":"2","type":"WatchEvent","created_at":"2025-12-06T01:00:00Z","repo":{"id":8,"name":"octocat/other"}}
        ]"#;
        let events = parse_events(body).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Push);
        assert_eq!(events[0].repo, "octocat/streak");
        assert_eq!(events[0].timestamp.to_rfc3339(), "2025-12-06T01:30:00+00:00");
        assert_eq!(events[1].kind, EventKind::Other("WatchEvent".to_string()));
    }

    #[test]
    fn parse_events_defaults_missing_repo() {
        let body = r#"[{"type":"PushEvent","created_at":"2025-12-06T01:30:00Z"}]"#;
        let events = parse_events(body).unwrap();
        assert_eq!(events[0].repo, UNKNOWN_REPO);
    }

    #[test]
    fn parse_events_rejects_missing_timestamp() {
        let body = r#"[{"type":"PushEvent","repo":{"name":"octocat/streak"}}]"#;
        assert!(matches!(
            parse_events(body),
            Err(GithubError::InvalidResponse(_))
        ));
    }

    #[test]
    fn parse_events_rejects_non_array() {
        let body = r#"{"message":"Not Found"}"#;
        assert!(matches!(
            parse_events(body),
            Err(GithubError::InvalidResponse(_))
        ));
    }

    #[test]
    fn parse_api_message_reads_github_error_body() {
        let body = r#"{"message":"Bad credentials","documentation_url":"https://docs.github.com/rest"}"#;
        assert_eq!(parse_api_message(body).as_deref(), Some("Bad credentials"));
        assert_eq!(parse_api_message("<html>"), None);
    }
}
