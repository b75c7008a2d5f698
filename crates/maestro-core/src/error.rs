//! Common error types for the Maestro core.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the conversation model and the stream interpreter.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// A server-sent event payload was not valid JSON.
    #[error("malformed event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// A fragment arrived but the last message is not an agent reply.
    #[error("no agent message in progress")]
    NoAgentMessage,
}
