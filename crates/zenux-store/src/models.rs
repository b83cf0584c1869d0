//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// A conversation with the assistant. Created on the first user message of
/// a new conversation; `last_message_at` is touched on every new message.
/// Sessions are never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// Owning user id (as reported by the auth provider).
    pub user_id: String,
    /// Short title, user-supplied or derived by the title heuristic.
    pub title: String,
    /// Timestamp of the most recent message in this chat.
    pub last_message_at: DateTime<Utc>,
    /// When the chat was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

/// Who produced a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// Kind of content a message carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Voice,
    File,
    Image,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Voice => "voice",
            MessageType::File => "file",
            MessageType::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageType::Text),
            "voice" => Some(MessageType::Voice),
            "file" => Some(MessageType::File),
            "image" => Some(MessageType::Image),
            _ => None,
        }
    }
}

/// A single chat message. Assistant messages are only persisted once their
/// stream has finalized; the in-flight placeholder never reaches this table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: Uuid,
    /// The chat this message belongs to.
    pub chat_id: Uuid,
    /// Sender role.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Content kind.
    pub message_type: MessageType,
    /// Free-form metadata (attachment info, model name, ...).
    pub metadata: Option<serde_json::Value>,
    /// Whether the content column holds ciphertext.
    pub encrypted: bool,
    /// Whether the assistant validated/moderated this message.
    pub ai_validated: bool,
    /// Set when the message was saved while the relay was unreachable and
    /// still awaits a sync attempt.
    pub pending_sync: bool,
    /// Creation timestamp; messages are fetched in ascending order of it.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a plain text message with fresh id and timestamp.
    pub fn text(chat_id: Uuid, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chat_id,
            role,
            content: content.into(),
            message_type: MessageType::Text,
            metadata: None,
            encrypted: false,
            ai_validated: false,
            pending_sync: false,
            created_at: Utc::now(),
        }
    }
}
