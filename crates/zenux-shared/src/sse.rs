//! Incremental SSE line codec.
//!
//! The relay forwards upstream chunks verbatim, so chunk boundaries carry no
//! meaning: one network read may contain zero, one, or several `data:`
//! lines, and may split a line (or a multi-byte UTF-8 sequence) anywhere.
//! [`SseLineBuffer`] reassembles complete lines from raw bytes; the helpers
//! below classify each line's payload.

use serde_json::Value;

use crate::constants::{DONE_SENTINEL, SSE_DATA_PREFIX};

/// Reassembles complete text lines from a stream of byte chunks.
///
/// Splitting happens at the byte level on `\n`, so a partial multi-byte
/// UTF-8 sequence at the end of a chunk is held in the buffer until the
/// rest of it arrives. Only complete lines are ever decoded.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buf: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of raw bytes; returns every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop(); // trailing \n
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Drain any trailing bytes that never received a newline. Called once
    /// when the underlying read reports completion.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Some(rest)
    }
}

/// Return the payload of a `data:`-prefixed line, or `None` for any other
/// SSE field (`event:`, `retry:`, comments) or blank separator line.
///
/// Repeated prefixes are stripped defensively: a relay hop that re-wraps an
/// already-framed upstream line produces `data: data: {...}`.
pub fn strip_data_prefix(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let mut rest = trimmed.strip_prefix(SSE_DATA_PREFIX)?;
    while let Some(stripped) = rest.trim_start().strip_prefix(SSE_DATA_PREFIX) {
        rest = stripped;
    }
    Some(rest.trim())
}

/// Classification of one data-line payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinePayload {
    /// The `[DONE]` end-of-stream sentinel. Never passed to the JSON parser.
    Done,
    /// A successfully parsed JSON object or value.
    Json(Value),
    /// Neither the sentinel nor recoverable JSON. Skipped by consumers; one
    /// bad line must not lose the rest of a response.
    Unparseable,
}

/// Parse a data-line payload, recovering from leading noise by reparsing
/// from the first `{` when the whole line fails to parse.
pub fn parse_payload(payload: &str) -> LinePayload {
    let payload = payload.trim();
    if payload.is_empty() {
        return LinePayload::Unparseable;
    }
    if payload == DONE_SENTINEL {
        return LinePayload::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => LinePayload::Json(value),
        Err(_) => {
            if let Some(idx) = payload.find('{') {
                if let Ok(value) = serde_json::from_str::<Value>(&payload[idx..]) {
                    return LinePayload::Json(value);
                }
            }
            LinePayload::Unparseable
        }
    }
}
