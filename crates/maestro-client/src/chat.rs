//! Message submission pipeline.
//!
//! [`Chat`] owns the [`ConversationState`] and drives one submission at a
//! time. The network side runs as a producer that turns the reply stream into
//! [`ConversationUpdate`]s; the consumer applies them to the store in order and
//! asks the [`Renderer`] to redraw after every change. Both halves run in the
//! same task, so a chunk is fully decoded, interpreted and merged before the
//! next one is read.

use std::pin::pin;

use futures::{Stream, StreamExt, TryStreamExt};
use maestro_core::{interpret, ConversationState, ConversationUpdate, Message, SessionId};
use tokio::sync::mpsc;

use crate::client::{AgentClient, ClientError};
use crate::session::{acquire_session, SessionBootstrap};
use crate::sse;

/// Capacity of the update queue between the stream reader and the store.
const UPDATE_QUEUE_CAPACITY: usize = 128;

/// Presentation layer fed by the conversation store.
pub trait Renderer {
    /// Redraw from the current messages and loading flag.
    ///
    /// Called after every mutation, including each growth of the reply in
    /// progress.
    fn render(&mut self, messages: &[Message], loading: bool);
}

/// A conversation with the agent service.
pub struct Chat {
    client: AgentClient,
    state: ConversationState,
    bootstrap: Option<SessionBootstrap>,
}

impl Chat {
    /// Create a chat over an initial conversation state.
    #[must_use]
    pub fn new(client: AgentClient, state: ConversationState) -> Self {
        Self {
            client,
            state,
            bootstrap: None,
        }
    }

    /// The conversation store.
    #[must_use]
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// The session bootstrap outcome, once [`Chat::start`] has run.
    #[must_use]
    pub fn bootstrap(&self) -> Option<&SessionBootstrap> {
        self.bootstrap.as_ref()
    }

    /// Whether the user may submit a message right now.
    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.state.input_enabled()
    }

    /// Acquire the session. Only the first call talks to the server.
    pub async fn start<R: Renderer>(&mut self, renderer: &mut R) -> &SessionBootstrap {
        let bootstrap = match self.bootstrap.take() {
            Some(bootstrap) => bootstrap,
            None => {
                let bootstrap = acquire_session(&self.client).await;
                self.state.set_session(bootstrap.session_id().clone());
                renderer.render(self.state.messages(), self.state.loading());
                bootstrap
            }
        };
        self.bootstrap.insert(bootstrap)
    }

    /// Submit a user message and stream the reply into the store.
    ///
    /// Returns `false` without doing anything if the text is blank, no
    /// session is set, or a reply is already in progress. Failures are
    /// reported in the conversation itself, never as an error.
    pub async fn submit<R: Renderer>(&mut self, text: &str, renderer: &mut R) -> bool {
        if self.state.loading() {
            tracing::debug!("Submission ignored while a reply is in progress");
            return false;
        }
        let Some(session_id) = self.state.session_id().cloned() else {
            tracing::debug!("Submission ignored before session bootstrap");
            return false;
        };
        if !self.state.append_user(text) {
            return false;
        }

        self.state.set_loading(true);
        renderer.render(self.state.messages(), self.state.loading());

        let Self { client, state, .. } = &mut *self;
        let (tx, mut rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);

        let producer = stream_reply(client, &session_id, text, tx);
        let consumer = async {
            while let Some(update) = rx.recv().await {
                if state.apply(update) {
                    renderer.render(state.messages(), state.loading());
                }
            }
        };
        tokio::join!(producer, consumer);

        if self.state.loading() {
            tracing::warn!("Reply ended without a terminal update");
            self.state.set_loading(false);
            renderer.render(self.state.messages(), self.state.loading());
        }

        true
    }
}

/// Submit `text` and forward the reply as updates.
///
/// Always finishes with exactly one `ReplyFinished` or `ReplyFailed`, unless
/// the receiving side has gone away.
pub async fn stream_reply(
    client: &AgentClient,
    session_id: &SessionId,
    text: &str,
    tx: mpsc::Sender<ConversationUpdate>,
) {
    let response = match client.run_sse(session_id, text).await {
        Ok(response) => response,
        Err(e) => {
            let _ = tx.send(ConversationUpdate::ReplyFailed(e.to_string())).await;
            return;
        }
    };

    if tx.send(ConversationUpdate::ReplyStarted).await.is_err() {
        return;
    }

    forward_events(response.bytes_stream().map_err(ClientError::from), &tx).await;
}

/// Decode, interpret and forward every event of a reply body.
pub async fn forward_events<S, B>(bytes: S, tx: &mpsc::Sender<ConversationUpdate>)
where
    S: Stream<Item = Result<B, ClientError>>,
    B: AsRef<[u8]>,
{
    let mut payloads = pin!(sse::data_payloads(bytes));
    let mut events = 0usize;

    while let Some(item) = payloads.next().await {
        let payload = match item {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, events, "Reply stream failed");
                let _ = tx.send(ConversationUpdate::ReplyFailed(e.to_string())).await;
                return;
            }
        };
        events += 1;

        match interpret(&payload) {
            Ok(interpretation) => {
                for name in &interpretation.function_calls {
                    tracing::info!(function = %name, "Agent called function");
                }
                if interpretation.has_text()
                    && tx
                        .send(ConversationUpdate::Fragment(interpretation.text))
                        .await
                        .is_err()
                {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, payload = %payload, "Error parsing SSE data");
            }
        }
    }

    tracing::debug!(events, "Reply stream complete");
    let _ = tx.send(ConversationUpdate::ReplyFinished).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect_updates(
        chunks: Vec<Result<&'static [u8], ClientError>>,
    ) -> Vec<ConversationUpdate> {
        let (tx, mut rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
        forward_events(stream::iter(chunks), &tx).await;
        drop(tx);

        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }
        updates
    }

    #[tokio::test]
    async fn events_become_fragments_in_order() {
        let updates = collect_updates(vec![
            Ok(b"data: {\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}\n\n".as_slice()),
            Ok(b"data: {\"content\":{\"parts\":[{\"text\":\" there\"}]}}\n\n".as_slice()),
        ])
        .await;

        assert_eq!(
            updates,
            vec![
                ConversationUpdate::Fragment("Hi".to_string()),
                ConversationUpdate::Fragment(" there".to_string()),
                ConversationUpdate::ReplyFinished,
            ]
        );
    }

    #[tokio::test]
    async fn malformed_and_textless_events_are_skipped() {
        let updates = collect_updates(vec![Ok(concat!(
            "data: {broken-json\n",
            "data: {\"content\":{\"parts\":[{\"functionCall\":{\"name\":\"ask_search_agent\"}}]}}\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ok\"}]}}]}\n",
        )
        .as_bytes())])
        .await;

        assert_eq!(
            updates,
            vec![
                ConversationUpdate::Fragment("ok".to_string()),
                ConversationUpdate::ReplyFinished,
            ]
        );
    }

    #[tokio::test]
    async fn read_failure_ends_with_reply_failed() {
        let updates = collect_updates(vec![
            Ok(b"data: {\"content\":{\"parts\":[{\"text\":\"par\"}]}}\n".as_slice()),
            Err(ClientError::Parse("connection reset".to_string())),
        ])
        .await;

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], ConversationUpdate::Fragment("par".to_string()));
        assert!(matches!(updates[1], ConversationUpdate::ReplyFailed(_)));
    }

    #[tokio::test]
    async fn final_text_is_independent_of_chunk_boundaries() {
        let body: &'static [u8] = concat!(
            ": ping\n",
            "data: {\"content\":{\"parts\":[{\"text\":\"Hé\"}]}}\n\n",
            "data: {\"content\":{\"parts\":[{\"text\":\"Héllo\"}]}}\n\n",
            "data: not json\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\", 世界\"}]}}]}\n\n",
        )
        .as_bytes();

        let merged = |updates: Vec<ConversationUpdate>| {
            let mut state = ConversationState::new();
            state.set_session(SessionId::generate());
            state.append_user("q");
            state.apply(ConversationUpdate::ReplyStarted);
            for update in updates {
                state.apply(update);
            }
            state.last().map(|m| m.text.clone()).unwrap_or_default()
        };

        let expected = merged(collect_updates(vec![Ok(body)]).await);
        assert_eq!(expected, "Héllo, 世界");

        for first in 1..body.len() {
            for second in (first + 1..body.len()).step_by(7) {
                let chunks = vec![
                    Ok(&body[..first]),
                    Ok(&body[first..second]),
                    Ok(&body[second..]),
                ];
                assert_eq!(merged(collect_updates(chunks).await), expected);
            }
        }
    }
}
