//! Line-oriented terminal renderer.
//!
//! Agent text is printed as it grows. Merged reply text only ever extends the
//! previous text, so each redraw writes just the new suffix instead of
//! repainting the screen.

use std::io::{self, Write};

use maestro_client::Renderer;
use maestro_core::Message;

/// Label printed before every agent message.
const AGENT_LABEL: &str = "Maestro: ";

/// Marker shown while waiting for the first reply text.
const THINKING: &str = "Thinking...";

/// Prints conversation changes to a writer.
pub struct TerminalRenderer<W: Write> {
    out: W,
    /// Messages already printed or skipped.
    seen: usize,
    /// Bytes of the newest agent message already printed.
    tail_len: usize,
    /// Whether the newest agent message still lacks its trailing newline.
    line_open: bool,
    was_loading: bool,
}

impl<W: Write> TerminalRenderer<W> {
    /// Create a renderer writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            seen: 0,
            tail_len: 0,
            line_open: false,
            was_loading: false,
        }
    }

    fn draw(&mut self, messages: &[Message], loading: bool) -> io::Result<()> {
        // Growth of the message currently being streamed.
        if self.line_open {
            if let Some(current) = self.seen.checked_sub(1).and_then(|i| messages.get(i)) {
                let text = current.text.as_str();
                if text.len() > self.tail_len && text.is_char_boundary(self.tail_len) {
                    self.out.write_all(text[self.tail_len..].as_bytes())?;
                    self.tail_len = text.len();
                }
            }
        }

        for message in messages.iter().skip(self.seen) {
            if message.is_user() {
                continue;
            }
            if self.line_open {
                writeln!(self.out)?;
            }
            write!(self.out, "{AGENT_LABEL}{}", message.text)?;
            self.tail_len = message.text.len();
            self.line_open = true;
        }
        self.seen = self.seen.max(messages.len());

        let awaiting_reply = messages.last().is_some_and(Message::is_user);
        if loading && !self.was_loading && awaiting_reply {
            writeln!(self.out, "{THINKING}")?;
        }

        if !loading && self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        self.was_loading = loading;

        self.out.flush()
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, messages: &[Message], loading: bool) {
        if let Err(e) = self.draw(messages, loading) {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }
}
