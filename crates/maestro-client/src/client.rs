//! HTTP client for the agent service.
//!
//! Two routes are used: session creation and the streaming run endpoint.

use maestro_core::SessionId;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::types::{CreateSessionResponse, NewMessage, RunRequest};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Client for the agent service REST API.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: Client,
    config: ClientConfig,
}

impl AgentClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { http, config })
    }

    /// Handle API error responses.
    async fn handle_error(response: Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Create a new session for the configured app and user.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-2xx status, or a body that
    /// is not a JSON object.
    pub async fn create_session(&self) -> Result<CreateSessionResponse, ClientError> {
        let url = self.config.session_url();
        tracing::debug!(url = %url, "Creating session");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    // =========================================================================
    // Run Operations
    // =========================================================================

    /// Submit a user message and open the reply stream.
    ///
    /// On success the response body is an open stream of server-sent events.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx status.
    pub async fn run_sse(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<Response, ClientError> {
        let url = self.config.run_url();
        let request = RunRequest {
            app_name: self.config.app_name.clone(),
            user_id: self.config.user_id.clone(),
            session_id: session_id.clone(),
            new_message: NewMessage::user(text),
        };

        tracing::debug!(url = %url, session_id = %session_id, "Submitting message");

        let response = self
            .http
            .post(&url)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        Ok(response)
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["detail", "error", "message"]
            .into_iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });

    Some(from_json.unwrap_or_else(|| body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(
            error_message(r#"{"detail":"Session not found"}"#).as_deref(),
            Some("Session not found")
        );
        assert_eq!(
            error_message(r#"{"error":"bad app"}"#).as_deref(),
            Some("bad app")
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(
            error_message("Internal Server Error").as_deref(),
            Some("Internal Server Error")
        );
        assert_eq!(error_message("  "), None);
    }

    #[test]
    fn client_error_display() {
        let err = ClientError::Api {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "API error (404): Not Found");
    }
}
