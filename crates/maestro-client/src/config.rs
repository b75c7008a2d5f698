//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for talking to the agent service.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the agent service (e.g., "http://localhost:8000").
    #[serde(default = "ClientConfig::default_base_url")]
    pub base_url: String,

    /// Application name the sessions and runs are scoped to.
    #[serde(default = "ClientConfig::default_app_name")]
    pub app_name: String,

    /// User identifier sent with every request.
    #[serde(default = "ClientConfig::default_user_id")]
    pub user_id: String,

    /// TCP connect timeout in seconds. Replies themselves are not time-limited.
    #[serde(default = "ClientConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl ClientConfig {
    fn default_base_url() -> String {
        "http://localhost:8000".to_string()
    }

    fn default_app_name() -> String {
        "orchestrator_agent".to_string()
    }

    fn default_user_id() -> String {
        "web_user".to_string()
    }

    const fn default_connect_timeout() -> u64 {
        10
    }

    /// Build a configuration for the given service URL with default scoping.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Base URL without trailing slashes.
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Endpoint that creates a session.
    #[must_use]
    pub fn session_url(&self) -> String {
        format!(
            "{}/apps/{}/users/{}/sessions",
            self.base(),
            self.app_name,
            self.user_id
        )
    }

    /// Endpoint that streams a reply as server-sent events.
    #[must_use]
    pub fn run_url(&self) -> String {
        format!("{}/run_sse", self.base())
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            app_name: Self::default_app_name(),
            user_id: Self::default_user_id(),
            connect_timeout_seconds: Self::default_connect_timeout(),
        }
    }
}
