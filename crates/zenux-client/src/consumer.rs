//! Reconstruction of an assistant reply from the relay's byte stream.
//!
//! [`StreamConsumer`] is the synchronous core: it takes raw chunks, splits
//! them into lines, extracts content deltas, and accumulates them into one
//! growing buffer. The async driver around it lives in [`crate::turn`].

use tracing::debug;

use zenux_shared::constants::FALLBACK_REPLY;
use zenux_shared::sse::{parse_payload, strip_data_prefix, LinePayload, SseLineBuffer};
use zenux_shared::wire::{extract_delta, extract_error, Delta};

/// Something worth acting on that a chunk produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerEvent {
    /// The accumulated content changed; re-render.
    ContentUpdated,
    /// The `[DONE]` sentinel was seen.
    Done,
    /// An in-band error event arrived; the stream has failed.
    Failed(String),
}

/// Accumulates assistant text from a stream of raw SSE bytes.
///
/// The internal buffer is append-only for `delta` shapes and only ever
/// replaced wholesale by a full-message shape; it is discarded (never
/// persisted) unless the owning turn finalizes.
#[derive(Default)]
pub struct StreamConsumer {
    lines: SseLineBuffer,
    buffer: String,
    failed: Option<String>,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk. One chunk may complete zero, one, or several
    /// lines; an event is emitted per line that changed the buffer, not
    /// per chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ConsumerEvent> {
        let mut events = Vec::new();
        for line in self.lines.push(chunk) {
            self.apply_line(&line, &mut events);
        }
        events
    }

    /// The accumulated content so far.
    pub fn content(&self) -> &str {
        &self.buffer
    }

    /// Consume the accumulator once the underlying read reports completion.
    ///
    /// Returns the final message text, substituting the fixed fallback when
    /// nothing was accumulated, or the in-band error if the stream failed.
    pub fn finish(mut self) -> Result<String, String> {
        // A well-formed stream ends with a newline, but flush any
        // unterminated tail before settling.
        if let Some(tail) = self.lines.finish() {
            let mut events = Vec::new();
            self.apply_line(&tail, &mut events);
        }

        if let Some(error) = self.failed {
            return Err(error);
        }
        if self.buffer.is_empty() {
            return Ok(FALLBACK_REPLY.to_string());
        }
        Ok(self.buffer)
    }

    fn apply_line(&mut self, line: &str, events: &mut Vec<ConsumerEvent>) {
        let Some(payload) = strip_data_prefix(line) else {
            // Not a data line: blank separator, comment, or another SSE
            // field. Nothing to do.
            return;
        };

        match parse_payload(payload) {
            LinePayload::Done => events.push(ConsumerEvent::Done),
            LinePayload::Unparseable => {
                // One bad line must not lose the rest of the response.
                debug!(line = %payload, "skipping unparseable stream line");
            }
            LinePayload::Json(value) => {
                if let Some(error) = extract_error(&value) {
                    self.failed = Some(error.clone());
                    events.push(ConsumerEvent::Failed(error));
                    return;
                }

                match extract_delta(&value) {
                    Some(Delta::Append(fragment)) if !fragment.is_empty() => {
                        self.buffer.push_str(&fragment);
                        events.push(ConsumerEvent::ContentUpdated);
                    }
                    Some(Delta::Replace(full)) => {
                        if self.buffer != full {
                            self.buffer = full;
                            events.push(ConsumerEvent::ContentUpdated);
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}
