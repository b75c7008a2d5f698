//! Core types for the Maestro chat client.
//!
//! This crate holds everything that does not touch the network:
//!
//! - **Identifiers**: the opaque [`SessionId`]
//! - **Conversation store**: [`ConversationState`] and the
//!   [`ConversationUpdate`] queue items that drive it
//! - **Event interpretation**: text extraction from streamed event payloads
//! - **Reconciliation**: the snapshot/delta merge rule for reply fragments
//!
//! # Example
//!
//! ```
//! use maestro_core::{ConversationState, ConversationUpdate, SessionId};
//!
//! let mut state = ConversationState::new();
//! state.set_session(SessionId::generate());
//! assert!(state.append_user("What's on tonight?"));
//!
//! state.apply(ConversationUpdate::ReplyStarted);
//! state.apply(ConversationUpdate::Fragment("Two".into()));
//! state.apply(ConversationUpdate::Fragment("Two shows".into()));
//! state.apply(ConversationUpdate::ReplyFinished);
//!
//! assert_eq!(state.last().unwrap().text, "Two shows");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod conversation;
pub mod error;
pub mod event;
pub mod ids;
pub mod message;
pub mod reconcile;

pub use conversation::{ConversationState, ConversationUpdate, DEFAULT_GREETING, ERROR_REPLY};
pub use error::{CoreError, Result};
pub use event::{interpret, EventPayload, Interpretation, Part};
pub use ids::{IdError, SessionId};
pub use message::{Message, Role};
pub use reconcile::{classify, merge, FragmentKind};
