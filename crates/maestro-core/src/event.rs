//! Interpretation of server-sent event payloads.
//!
//! Each `data:` record carries one JSON event in one of two envelopes:
//!
//! ```text
//! { "content": { "parts": [ ... ] } }                      agent event
//! { "candidates": [ { "content": { "parts": [ ... ] } } ] } raw model response
//! ```
//!
//! The agent envelope wins when both are present. Only the first candidate is
//! read. Each part is decoded on its own and carries either `text` or a
//! function-call marker; function calls are reported separately and never
//! reach the merged reply text.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

/// One part of an event's content.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Part {
    /// Generated text.
    #[serde(default)]
    pub text: Option<String>,
    /// Function-call marker, kept as raw JSON.
    #[serde(default, rename = "functionCall", alias = "function_call")]
    pub function_call: Option<Value>,
}

impl Part {
    /// Name of the announced function, if this part is a function call.
    ///
    /// Markers without a string `name` are reported as `"unknown"`.
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        self.function_call.as_ref().map(|call| {
            call.get("name")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
        })
    }
}

/// Decode each part on its own so one odd part cannot hide its siblings.
fn decode_parts(parts: &Value) -> Vec<Part> {
    let Some(items) = parts.as_array() else {
        tracing::debug!("Event parts are not an array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match Part::deserialize(item) {
            Ok(part) => Some(part),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable event part");
                None
            }
        })
        .collect()
}

/// A classified event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Agent event envelope (`content.parts`).
    Content(Vec<Part>),
    /// Raw model envelope (`candidates[0].content.parts`).
    Candidate(Vec<Part>),
    /// Neither envelope is present; carries no text.
    Empty,
}

impl EventPayload {
    /// Parse a `data:` payload.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedPayload`](crate::CoreError::MalformedPayload)
    /// if the payload is not valid JSON. Valid JSON of an unknown shape is
    /// classified as [`EventPayload::Empty`].
    pub fn parse(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)?;
        Ok(Self::from_value(&value))
    }

    /// Classify an already-parsed JSON value.
    ///
    /// `content.parts` wins whenever it is present, whatever the rest of the
    /// event looks like.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        if let Some(parts) = value.get("content").and_then(|content| content.get("parts")) {
            return Self::Content(decode_parts(parts));
        }

        value
            .get("candidates")
            .and_then(|candidates| candidates.get(0))
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .map_or(Self::Empty, |parts| Self::Candidate(decode_parts(parts)))
    }

    /// The parts carried by this event, in order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        match self {
            Self::Content(parts) | Self::Candidate(parts) => parts,
            Self::Empty => &[],
        }
    }

    /// Extract the text and function calls carried by this event.
    #[must_use]
    pub fn interpret(&self) -> Interpretation {
        let mut interpretation = Interpretation::default();
        for part in self.parts() {
            match (&part.text, part.function_name()) {
                (Some(text), _) if !text.is_empty() => interpretation.text.push_str(text),
                (_, Some(name)) => interpretation.function_calls.push(name.to_string()),
                _ => {}
            }
        }
        interpretation
    }
}

/// What one event contributes to the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpretation {
    /// Concatenated text of all text parts; empty if there were none.
    pub text: String,
    /// Names of functions the agent announced in this event.
    pub function_calls: Vec<String>,
}

impl Interpretation {
    /// Check whether the event carried any text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Parse and interpret one `data:` payload.
///
/// # Errors
///
/// Returns [`CoreError::MalformedPayload`](crate::CoreError::MalformedPayload)
/// if the payload is not valid JSON.
pub fn interpret(payload: &str) -> Result<Interpretation> {
    Ok(EventPayload::parse(payload)?.interpret())
}
