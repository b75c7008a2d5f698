//! Request and response bodies for the agent service.

use maestro_core::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Session Types
// =============================================================================

/// Response for creating a session.
///
/// Servers report the identifier as `session_id` or, in other versions, `id`.
/// Both are kept as raw JSON so an unexpected type does not fail the parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionResponse {
    /// Primary identifier field.
    #[serde(default)]
    pub session_id: Option<Value>,
    /// Secondary identifier field.
    #[serde(default)]
    pub id: Option<Value>,
}

impl CreateSessionResponse {
    /// Resolve the session identifier, preferring `session_id` over `id`.
    ///
    /// Only non-empty strings count as present.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        [&self.session_id, &self.id]
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .find_map(|raw| SessionId::new(raw).ok())
    }
}

// =============================================================================
// Run Types
// =============================================================================

/// One text part of a submitted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPart {
    /// The text.
    pub text: String,
}

/// The message being submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    /// Always "user".
    pub role: String,
    /// Message parts.
    pub parts: Vec<TextPart>,
}

impl NewMessage {
    /// Create a single-part user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

/// Body of a streaming run request.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    /// Application name.
    pub app_name: String,
    /// User identifier.
    pub user_id: String,
    /// Session the message belongs to.
    pub session_id: SessionId,
    /// The user's message.
    pub new_message: NewMessage,
}
