//! Server-sent event framing.
//!
//! The reply body is newline-delimited. Only `data: ` lines matter; blank
//! keep-alives, comments and other fields are dropped. Bytes are buffered
//! until a newline arrives, so a record split across reads is reassembled
//! and multi-byte characters are never cut in half.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};

const DATA_PREFIX: &[u8] = b"data: ";

/// Incremental decoder that turns body bytes into `data:` payloads.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
}

impl SseLineDecoder {
    /// Feed arbitrary bytes and drain the payloads of all completed lines.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        let mut line_start = 0;

        while let Some(offset) = self.buffer[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            let newline = self.scanned + offset;
            let line = &self.buffer[line_start..newline];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if let Some(payload) = extract_data_payload(line) {
                payloads.push(payload);
            }

            line_start = newline + 1;
            self.scanned = line_start;
        }

        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();
        payloads
    }

    /// Number of buffered bytes that do not yet form a complete line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// End of stream. Any incomplete trailing line is discarded.
    ///
    /// Returns the number of discarded bytes.
    pub fn finish(self) -> usize {
        let discarded = self.buffer.len();
        if discarded > 0 {
            tracing::debug!(bytes = discarded, "Discarding incomplete trailing record");
        }
        discarded
    }

    /// Decode a complete body in one shot.
    #[must_use]
    pub fn decode_all(input: &[u8]) -> Vec<String> {
        let mut decoder = Self::default();
        let payloads = decoder.feed(input);
        decoder.finish();
        payloads
    }
}

fn extract_data_payload(line: &[u8]) -> Option<String> {
    line.strip_prefix(DATA_PREFIX)
        .map(|payload| String::from_utf8_lossy(payload).into_owned())
}

struct PayloadState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseLineDecoder,
    ready: VecDeque<String>,
    done: bool,
}

/// Adapt a byte stream into a lazy stream of `data:` payloads.
///
/// Payloads are yielded in arrival order as soon as their line is complete.
/// A read error is yielded once and ends the stream.
pub fn data_payloads<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let state = PayloadState {
        bytes: Box::pin(bytes),
        decoder: SseLineDecoder::default(),
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.ready.pop_front() {
                return Some((Ok(payload), state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.feed(chunk.as_ref());
                    state.ready.extend(payloads);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.done = true;
                    std::mem::take(&mut state.decoder).finish();
                }
            }
        }
    })
}
