//! Session bootstrap.
//!
//! A session identifier is acquired once, before input is enabled. Failure is
//! never fatal: a locally generated identifier is substituted so the
//! conversation can proceed, although the server may reject it.

use maestro_core::SessionId;

use crate::client::AgentClient;

/// Outcome of acquiring a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBootstrap {
    /// The server issued this identifier.
    Acquired(SessionId),
    /// The server did not issue one; this identifier was generated locally.
    Fallback(SessionId),
}

impl SessionBootstrap {
    /// The identifier to use for submissions.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Acquired(id) | Self::Fallback(id) => id,
        }
    }

    /// Whether the identifier was generated locally.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Acquire a session identifier from the server, falling back to a local one.
pub async fn acquire_session(client: &AgentClient) -> SessionBootstrap {
    match client.create_session().await {
        Ok(response) => {
            if let Some(session_id) = response.session_id() {
                tracing::info!(session_id = %session_id, "Session created");
                SessionBootstrap::Acquired(session_id)
            } else {
                let session_id = SessionId::generate();
                tracing::warn!(
                    session_id = %session_id,
                    "No session ID in response, using generated ID"
                );
                SessionBootstrap::Fallback(session_id)
            }
        }
        Err(e) => {
            let session_id = SessionId::generate();
            tracing::warn!(
                error = %e,
                session_id = %session_id,
                "Failed to create session, using generated ID"
            );
            SessionBootstrap::Fallback(session_id)
        }
    }
}
