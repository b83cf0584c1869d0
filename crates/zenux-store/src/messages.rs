//! CRUD operations for [`ChatMessage`] records, including the offline
//! outbox used when the relay is unreachable at send time.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ChatMessage, MessageType, Role};

impl Database {
    /// Insert a message.
    pub fn insert_message(&self, message: &ChatMessage) -> Result<()> {
        let metadata = message
            .metadata
            .as_ref()
            .map(|m| m.to_string());

        self.conn().execute(
            "INSERT INTO messages
                 (id, chat_id, role, content, message_type, metadata,
                  encrypted, ai_validated, pending_sync, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                message.id.to_string(),
                message.chat_id.to_string(),
                message.role.as_str(),
                message.content,
                message.message_type.as_str(),
                metadata,
                message.encrypted,
                message.ai_validated,
                message.pending_sync,
                message.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch every message of a chat, in ascending creation order.
    pub fn get_messages_by_chat(&self, chat_id: Uuid) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, chat_id, role, content, message_type, metadata,
                    encrypted, ai_validated, pending_sync, created_at
             FROM messages
             WHERE chat_id = ?1
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![chat_id.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Fetch a single message by UUID.
    pub fn get_message_by_id(&self, id: Uuid) -> Result<ChatMessage> {
        self.conn()
            .query_row(
                "SELECT id, chat_id, role, content, message_type, metadata,
                        encrypted, ai_validated, pending_sync, created_at
                 FROM messages WHERE id = ?1",
                params![id.to_string()],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Delete a message. Returns `true` if a row was deleted.
    pub fn delete_message(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM messages WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Offline outbox
    // ------------------------------------------------------------------

    /// Messages saved while offline, oldest first, awaiting a sync attempt.
    pub fn list_pending_sync(&self) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, chat_id, role, content, message_type, metadata,
                    encrypted, ai_validated, pending_sync, created_at
             FROM messages
             WHERE pending_sync = 1
             ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map([], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Clear the outbox flag after a successful sync.
    pub fn mark_message_synced(&self, id: Uuid) -> Result<()> {
        self.conn().execute(
            "UPDATE messages SET pending_sync = 0 WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }
}

/// Map a `rusqlite::Row` to a [`ChatMessage`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let id_str: String = row.get(0)?;
    let chat_id_str: String = row.get(1)?;
    let role_str: String = row.get(2)?;
    let content: String = row.get(3)?;
    let type_str: String = row.get(4)?;
    let metadata_str: Option<String> = row.get(5)?;
    let encrypted: bool = row.get(6)?;
    let ai_validated: bool = row.get(7)?;
    let pending_sync: bool = row.get(8)?;
    let ts_str: String = row.get(9)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let chat_id = Uuid::parse_str(&chat_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown role '{role_str}'").into(),
        )
    })?;

    let message_type = MessageType::parse(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown message type '{type_str}'").into(),
        )
    })?;

    let metadata = match metadata_str {
        Some(s) => Some(serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?),
        None => None,
    };

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ChatMessage {
        id,
        chat_id,
        role,
        content,
        message_type,
        metadata,
        encrypted,
        ai_validated,
        pending_sync,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatSession;

    fn setup_chat(db: &Database) -> Uuid {
        let now = Utc::now();
        let chat = ChatSession {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            title: "test".to_string(),
            last_message_at: now,
            created_at: now,
        };
        db.create_chat(&chat).unwrap();
        chat.id
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let chat_id = setup_chat(&db);

        let mut msg = ChatMessage::text(chat_id, Role::User, "hello");
        msg.metadata = Some(serde_json::json!({"model": "zenux-1"}));
        db.insert_message(&msg).unwrap();

        let fetched = db.get_message_by_id(msg.id).unwrap();
        assert_eq!(fetched, msg);
    }

    #[test]
    fn messages_come_back_in_ascending_created_order() {
        let db = Database::open_in_memory().unwrap();
        let chat_id = setup_chat(&db);

        let base = Utc::now();
        for (i, text) in ["first", "second", "third"].iter().enumerate() {
            let mut msg = ChatMessage::text(chat_id, Role::User, *text);
            // Insert out of order; created_at decides the read order.
            msg.created_at = base + chrono::Duration::seconds((3 - i) as i64);
            db.insert_message(&msg).unwrap();
        }

        let messages = db.get_messages_by_chat(chat_id).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);
    }

    #[test]
    fn sibling_round_trip_preserves_relative_order() {
        let db = Database::open_in_memory().unwrap();
        let chat_id = setup_chat(&db);

        let mut user = ChatMessage::text(chat_id, Role::User, "question");
        user.created_at = Utc::now();
        let mut assistant = ChatMessage::text(chat_id, Role::Assistant, "answer");
        assistant.created_at = user.created_at + chrono::Duration::seconds(1);

        db.insert_message(&assistant).unwrap();
        db.insert_message(&user).unwrap();

        let messages = db.get_messages_by_chat(chat_id).unwrap();
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn outbox_lists_then_clears_pending_messages() {
        let db = Database::open_in_memory().unwrap();
        let chat_id = setup_chat(&db);

        let mut offline = ChatMessage::text(chat_id, Role::User, "offline send");
        offline.pending_sync = true;
        db.insert_message(&offline).unwrap();
        db.insert_message(&ChatMessage::text(chat_id, Role::User, "online send"))
            .unwrap();

        let pending = db.list_pending_sync().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, offline.id);

        db.mark_message_synced(offline.id).unwrap();
        assert!(db.list_pending_sync().unwrap().is_empty());
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let db = Database::open_in_memory().unwrap();
        let chat_id = setup_chat(&db);

        let msg = ChatMessage::text(chat_id, Role::User, "bye");
        db.insert_message(&msg).unwrap();

        assert!(db.delete_message(msg.id).unwrap());
        assert!(!db.delete_message(msg.id).unwrap());
    }

    #[test]
    fn deleting_chat_cascades_to_messages() {
        let db = Database::open_in_memory().unwrap();
        let chat_id = setup_chat(&db);

        let msg = ChatMessage::text(chat_id, Role::User, "orphan?");
        db.insert_message(&msg).unwrap();

        db.delete_chat(chat_id).unwrap();
        assert!(matches!(
            db.get_message_by_id(msg.id),
            Err(StoreError::NotFound)
        ));
    }
}
