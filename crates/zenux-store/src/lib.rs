//! # zenux-store
//!
//! Local chat session store for the Zenux AI client, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for chats and
//! messages, including the offline outbox used when the relay is
//! unreachable at send time.

pub mod chats;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
