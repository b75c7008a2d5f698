//! Network side of the Maestro chat client.
//!
//! - [`AgentClient`]: HTTP calls for session creation and message submission
//! - [`acquire_session`]: session bootstrap with a local fallback identifier
//! - [`sse`]: incremental decoding of `data:` lines from a reply body
//! - [`Chat`]: the submission pipeline feeding a
//!   [`maestro_core::ConversationState`] and a [`Renderer`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chat;
pub mod client;
pub mod config;
pub mod session;
pub mod sse;
pub mod types;

pub use chat::{forward_events, stream_reply, Chat, Renderer};
pub use client::{AgentClient, ClientError};
pub use config::ClientConfig;
pub use session::{acquire_session, SessionBootstrap};
pub use sse::{data_payloads, SseLineDecoder};
