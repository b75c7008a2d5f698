//! Conversation state store.
//!
//! [`ConversationState`] is the single source of truth the renderer observes:
//! the ordered message list, the loading flag, and the session identifier that
//! gates submission. While a reply streams, only the last message may change,
//! and only if it is an agent message.
//!
//! The streaming pipeline does not touch the store directly. It sends
//! [`ConversationUpdate`] values through a queue and the owner applies them in
//! order with [`ConversationState::apply`].

use crate::error::{CoreError, Result};
use crate::ids::SessionId;
use crate::message::Message;
use crate::reconcile::{self, FragmentKind};

/// Text shown as a new agent message when a submission fails.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Greeting shown before the first user message.
pub const DEFAULT_GREETING: &str = "Hello! I'm your personal assistant. I can help you find concerts, plan workouts, or answer general questions. How can I help you today?";

/// One step of a streamed reply, applied to the store in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationUpdate {
    /// The server accepted the submission; an empty agent message is appended.
    ReplyStarted,
    /// Text extracted from one event, merged into the in-progress message.
    Fragment(String),
    /// The submission or the stream failed.
    ReplyFailed(String),
    /// The stream ended normally.
    ReplyFinished,
}

/// Ordered messages plus loading flag and session gate.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    loading: bool,
    session_id: Option<SessionId>,
}

impl ConversationState {
    /// Create an empty conversation with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation seeded with an agent greeting.
    #[must_use]
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::agent(greeting)],
            ..Self::default()
        }
    }

    /// Messages in conversation order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether a reply is in progress.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// The session identifier, once acquired.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Whether the user may submit a message right now.
    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.session_id.is_some() && !self.loading
    }

    /// Record the session identifier. Later calls are ignored.
    pub fn set_session(&mut self, session_id: SessionId) {
        if let Some(existing) = &self.session_id {
            tracing::warn!(existing = %existing, ignored = %session_id, "Session already set");
            return;
        }
        self.session_id = Some(session_id);
    }

    /// Append a user message.
    ///
    /// Returns `false` without changing anything if `text` is blank or no
    /// session identifier has been set yet.
    pub fn append_user(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.session_id.is_none() {
            return false;
        }
        self.messages.push(Message::user(text));
        true
    }

    /// Append an empty agent message to receive streamed text.
    pub fn append_agent_placeholder(&mut self) {
        self.messages.push(Message::agent(String::new()));
    }

    /// Replace the text of the last message, which must be an agent message.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoAgentMessage`] if the last message is missing or
    /// was written by the user.
    pub fn update_last_agent(&mut self, text: impl Into<String>) -> Result<()> {
        let last = self.last_agent_mut()?;
        last.text = text.into();
        Ok(())
    }

    /// Reconcile a fragment into the last agent message.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoAgentMessage`] if the last message is missing or
    /// was written by the user.
    pub fn merge_fragment(&mut self, fragment: &str) -> Result<FragmentKind> {
        let last = self.last_agent_mut()?;
        Ok(reconcile::merge_into(&mut last.text, fragment))
    }

    /// Append an agent message carrying an error notice.
    pub fn append_error_agent(&mut self, text: impl Into<String>) {
        self.messages.push(Message::agent(text));
    }

    /// Set the loading flag.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Apply one queued update.
    ///
    /// Returns `true` if the renderer should redraw.
    pub fn apply(&mut self, update: ConversationUpdate) -> bool {
        match update {
            ConversationUpdate::ReplyStarted => {
                self.append_agent_placeholder();
                true
            }
            ConversationUpdate::Fragment(fragment) => {
                if fragment.is_empty() {
                    return false;
                }
                match self.merge_fragment(&fragment) {
                    Ok(kind) => {
                        tracing::trace!(?kind, len = fragment.len(), "Merged reply fragment");
                        true
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping fragment");
                        false
                    }
                }
            }
            ConversationUpdate::ReplyFailed(reason) => {
                tracing::warn!(reason = %reason, "Reply failed");
                self.append_error_agent(ERROR_REPLY);
                self.loading = false;
                true
            }
            ConversationUpdate::ReplyFinished => {
                self.loading = false;
                true
            }
        }
    }

    fn last_agent_mut(&mut self) -> Result<&mut Message> {
        match self.messages.last_mut() {
            Some(last) if last.is_agent() => Ok(last),
            _ => Err(CoreError::NoAgentMessage),
        }
    }
}
