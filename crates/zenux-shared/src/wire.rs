//! Wire types exchanged between the chat client, the relay, and the
//! upstream AI gateway, plus the delta extraction logic that turns a parsed
//! stream line into an increment of assistant text.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Body of `POST /api/ai/chat` (client -> relay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRelayRequest {
    /// The user's message text. Defaults to empty when the field is absent
    /// so the relay can reject missing and blank messages the same way,
    /// with a 400 before any upstream call.
    #[serde(default)]
    pub message: String,

    /// Chat session this turn belongs to, if one exists yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,

    /// Client-claimed user id. Overridden by the verified identity whenever
    /// a bearer token is presented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Chat-completion request the relay forwards to the upstream gateway.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamChatRequest {
    pub model: String,
    pub messages: Vec<UpstreamMessage>,
    pub stream: bool,
}

/// One message in the upstream conversation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: String,
    pub content: String,
}

impl UpstreamMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// An incremental piece of assistant output extracted from one stream line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Append to the accumulating buffer (token-streaming shape).
    Append(String),
    /// Replace the whole buffer (full-message shape).
    Replace(String),
}

type Extractor = fn(&Value) -> Option<Delta>;

/// Known upstream response shapes, tried in fixed priority order. The
/// gateway normally emits the `choices[0].delta.content` streaming shape,
/// but some models fall back to a full `message` object or a flat
/// `content` field, so each extractor is attempted until one matches.
const EXTRACTORS: &[Extractor] = &[
    choices_delta_content,
    choices_message_content,
    flat_content,
];

/// Extract an assistant-text delta from a parsed stream line, if the line
/// carries one.
pub fn extract_delta(value: &Value) -> Option<Delta> {
    EXTRACTORS.iter().find_map(|extract| extract(value))
}

/// Extract an in-band error message from a parsed stream line.
///
/// The relay surfaces upstream failures as `{"error": ...}` data events
/// once response headers are already committed.
pub fn extract_error(value: &Value) -> Option<String> {
    let err = value.get("error")?;
    if let Some(text) = err.as_str() {
        return Some(text.to_string());
    }
    if let Some(text) = err.get("message").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    Some(err.to_string())
}

fn choices_delta_content(value: &Value) -> Option<Delta> {
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(|s| Delta::Append(s.to_string()))
}

fn choices_message_content(value: &Value) -> Option<Delta> {
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| Delta::Replace(s.to_string()))
}

fn flat_content(value: &Value) -> Option<Delta> {
    value
        .get("content")?
        .as_str()
        .map(|s| Delta::Append(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_streaming_delta_shape() {
        let v = json!({"choices": [{"delta": {"content": "Hel"}}]});
        assert_eq!(extract_delta(&v), Some(Delta::Append("Hel".to_string())));
    }

    #[test]
    fn extracts_full_message_shape_as_replace() {
        let v = json!({"choices": [{"message": {"content": "full reply"}}]});
        assert_eq!(
            extract_delta(&v),
            Some(Delta::Replace("full reply".to_string()))
        );
    }

    #[test]
    fn extracts_flat_content_shape() {
        let v = json!({"content": "piece"});
        assert_eq!(extract_delta(&v), Some(Delta::Append("piece".to_string())));
    }

    #[test]
    fn delta_shape_wins_over_flat_content() {
        let v = json!({
            "content": "ignored",
            "choices": [{"delta": {"content": "kept"}}]
        });
        assert_eq!(extract_delta(&v), Some(Delta::Append("kept".to_string())));
    }

    #[test]
    fn no_delta_in_unrelated_object() {
        let v = json!({"choices": [{"finish_reason": "stop"}]});
        assert_eq!(extract_delta(&v), None);
    }

    #[test]
    fn error_as_plain_string() {
        let v = json!({"error": "gateway unreachable"});
        assert_eq!(extract_error(&v), Some("gateway unreachable".to_string()));
    }

    #[test]
    fn error_as_object_with_message() {
        let v = json!({"error": {"message": "rate limited", "code": 429}});
        assert_eq!(extract_error(&v), Some("rate limited".to_string()));
    }

    #[test]
    fn no_error_in_content_line() {
        let v = json!({"content": "hello"});
        assert_eq!(extract_error(&v), None);
    }

    #[test]
    fn relay_request_roundtrip() {
        let req = ChatRelayRequest {
            message: "hello".to_string(),
            conversation_id: Some(Uuid::new_v4()),
            user_id: Some("user-1".to_string()),
        };
        let json = serde_json::to_string(&req).unwrap();
        let restored: ChatRelayRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.message, req.message);
        assert_eq!(restored.conversation_id, req.conversation_id);
    }

    #[test]
    fn relay_request_optional_fields_default() {
        let req: ChatRelayRequest =
            serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert!(req.conversation_id.is_none());
        assert!(req.user_id.is_none());
    }

    #[test]
    fn relay_request_missing_message_deserializes_empty() {
        // The body must still deserialize so the handler can answer 400
        // instead of the extractor bouncing it as unprocessable.
        let req: ChatRelayRequest =
            serde_json::from_str(r#"{"conversation_id": null}"#).unwrap();
        assert!(req.message.is_empty());
    }
}
