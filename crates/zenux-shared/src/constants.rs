//! Protocol-wide constants.

use uuid::Uuid;

/// End-of-stream sentinel emitted by the upstream gateway. Not valid JSON;
/// must be special-cased before any parse attempt.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Prefix of an SSE data line.
pub const SSE_DATA_PREFIX: &str = "data:";

/// Reply persisted when a stream ends without yielding any content.
/// Never persist an empty assistant message.
pub const FALLBACK_REPLY: &str =
    "I wasn't able to generate a response. Please try again.";

/// Maximum length of an auto-generated chat title, in characters.
pub const MAX_TITLE_CHARS: usize = 50;

/// Sentinel id of the in-flight assistant placeholder message. Exactly one
/// placeholder exists per in-flight turn; it is replaced by a freshly
/// generated id when the stream finalizes.
pub const PLACEHOLDER_MESSAGE_ID: Uuid = Uuid::nil();
