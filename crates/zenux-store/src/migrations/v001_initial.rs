//! v001 -- Initial schema creation.
//!
//! Creates the two core tables: `chats` and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    id              TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    user_id         TEXT NOT NULL,              -- auth provider user id
    title           TEXT NOT NULL,
    last_message_at TEXT NOT NULL,              -- ISO-8601 / RFC-3339
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chats_user_last
    ON chats(user_id, last_message_at DESC);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id           TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    chat_id      TEXT NOT NULL,                 -- FK -> chats(id)
    role         TEXT NOT NULL,                 -- 'user' | 'assistant'
    content      TEXT NOT NULL,
    message_type TEXT NOT NULL DEFAULT 'text',  -- text | voice | file | image
    metadata     TEXT,                          -- JSON, nullable
    encrypted    INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    ai_validated INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    pending_sync INTEGER NOT NULL DEFAULT 0,    -- offline outbox flag
    created_at   TEXT NOT NULL,

    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_created
    ON messages(chat_id, created_at ASC);

CREATE INDEX IF NOT EXISTS idx_messages_pending
    ON messages(pending_sync) WHERE pending_sync = 1;
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
