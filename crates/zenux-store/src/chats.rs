//! CRUD operations for [`ChatSession`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::ChatSession;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new chat session.
    pub fn create_chat(&self, chat: &ChatSession) -> Result<()> {
        self.conn().execute(
            "INSERT INTO chats (id, user_id, title, last_message_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                chat.id.to_string(),
                chat.user_id,
                chat.title,
                chat.last_message_at.to_rfc3339(),
                chat.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single chat by UUID.
    pub fn get_chat(&self, id: Uuid) -> Result<ChatSession> {
        self.conn()
            .query_row(
                "SELECT id, user_id, title, last_message_at, created_at
                 FROM chats
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_chat,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List a user's chats, most recently active first.
    pub fn list_chats_for_user(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, title, last_message_at, created_at
             FROM chats
             WHERE user_id = ?1
             ORDER BY last_message_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id], row_to_chat)?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(row?);
        }
        Ok(chats)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Bump `last_message_at`. Called on every new message in the chat.
    pub fn touch_chat(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "UPDATE chats SET last_message_at = ?2 WHERE id = ?1",
            params![id.to_string(), at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Replace the chat title. Last write wins; there is no concurrency
    /// contract on title updates.
    pub fn rename_chat(&self, id: Uuid, title: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE chats SET title = ?2 WHERE id = ?1",
            params![id.to_string(), title],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a chat (and, via FK cascade, its messages). Returns `true`
    /// if a row was deleted. Only ever user-initiated; chats are never
    /// deleted automatically.
    pub fn delete_chat(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM chats WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`ChatSession`].
fn row_to_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatSession> {
    let id_str: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let title: String = row.get(2)?;
    let last_str: String = row.get(3)?;
    let created_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let last_message_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&last_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ChatSession {
        id,
        user_id,
        title,
        last_message_at,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(user: &str, title: &str) -> ChatSession {
        let now = Utc::now();
        ChatSession {
            id: Uuid::new_v4(),
            user_id: user.to_string(),
            title: title.to_string(),
            last_message_at: now,
            created_at: now,
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let c = chat("user-1", "Payment Discussion");
        db.create_chat(&c).unwrap();

        let fetched = db.get_chat(c.id).unwrap();
        assert_eq!(fetched, c);
    }

    #[test]
    fn get_missing_chat_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_chat(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn list_orders_by_recency_and_filters_by_user() {
        let db = Database::open_in_memory().unwrap();

        let mut older = chat("user-1", "older");
        older.last_message_at = Utc::now() - chrono::Duration::hours(2);
        let newer = chat("user-1", "newer");
        let other = chat("user-2", "other");

        db.create_chat(&older).unwrap();
        db.create_chat(&newer).unwrap();
        db.create_chat(&other).unwrap();

        let chats = db.list_chats_for_user("user-1").unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].title, "newer");
        assert_eq!(chats[1].title, "older");
    }

    #[test]
    fn touch_bumps_last_message_at() {
        let db = Database::open_in_memory().unwrap();
        let mut c = chat("user-1", "t");
        c.last_message_at = Utc::now() - chrono::Duration::hours(1);
        db.create_chat(&c).unwrap();

        let later = Utc::now();
        db.touch_chat(c.id, later).unwrap();

        let fetched = db.get_chat(c.id).unwrap();
        assert!(fetched.last_message_at > c.last_message_at);
    }

    #[test]
    fn rename_replaces_title() {
        let db = Database::open_in_memory().unwrap();
        let c = chat("user-1", "before");
        db.create_chat(&c).unwrap();

        db.rename_chat(c.id, "after").unwrap();
        assert_eq!(db.get_chat(c.id).unwrap().title, "after");
    }

    #[test]
    fn delete_reports_whether_row_existed() {
        let db = Database::open_in_memory().unwrap();
        let c = chat("user-1", "t");
        db.create_chat(&c).unwrap();

        assert!(db.delete_chat(c.id).unwrap());
        assert!(!db.delete_chat(c.id).unwrap());
    }
}
