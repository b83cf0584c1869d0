//! UI notification events.
//!
//! The client core pushes these over an unbounded channel; the UI host
//! (desktop shell, web frontend bridge, test harness) decides how to
//! render them.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Informational, e.g. "saved offline, will send later".
    Info,
    /// Dismissible failure notification.
    Error,
}

/// Events the UI layer reacts to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEvent {
    /// A new chat session was created (first message of a conversation).
    ChatCreated { chat_id: Uuid, title: String },

    /// An assistant placeholder should be shown for an in-flight turn.
    AssistantPlaceholder { chat_id: Uuid, message_id: Uuid },

    /// The accumulated assistant text changed; re-render the placeholder.
    AssistantDelta { chat_id: Uuid, content: String },

    /// The turn finalized; the placeholder is replaced by a real message.
    AssistantCompleted { chat_id: Uuid, message_id: Uuid },

    /// The turn failed; drop the placeholder and offer a retry.
    TurnFailed { chat_id: Uuid, error: String },

    /// The user aborted the turn; drop the placeholder quietly (no failure
    /// toast).
    TurnCancelled { chat_id: Uuid },

    /// Free-form user-visible notice.
    Notice { kind: NoticeKind, text: String },
}

/// Send an event, tolerating a dropped receiver (e.g. during shutdown).
pub fn emit(sink: Option<&UnboundedSender<UiEvent>>, event: UiEvent) {
    if let Some(tx) = sink {
        if tx.send(event).is_err() {
            tracing::debug!("UI event receiver dropped");
        }
    }
}
