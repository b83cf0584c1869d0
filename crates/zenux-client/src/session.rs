//! Chat session orchestration.
//!
//! [`ChatClient`] owns the local store and a relay transport and runs the
//! full send flow: resolve or create the chat, persist the outbound
//! message, stream the assistant reply, and persist it once finalized.
//! Assistant text is never written to the store mid-stream.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use zenux_shared::constants::PLACEHOLDER_MESSAGE_ID;
use zenux_shared::title::suggest_title;
use zenux_shared::wire::ChatRelayRequest;
use zenux_store::{ChatMessage, ChatSession, Database, Role};

use crate::cancel::CancelHandle;
use crate::error::ClientError;
use crate::events::{emit, NoticeKind, UiEvent};
use crate::relay::{RelayTransport, TransportError};
use crate::turn::{run_turn, TurnOutcome};

/// How a send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    /// The assistant reply finalized and was persisted under `message_id`.
    Completed { chat_id: Uuid, message_id: Uuid },
    /// The relay was unreachable; the outbound message was saved with the
    /// outbox flag set and will be replayed by [`ChatClient::sync_outbox`].
    SavedOffline { chat_id: Uuid, message_id: Uuid },
    /// The user aborted the turn. Only the outbound message was persisted.
    Cancelled { chat_id: Uuid },
}

/// Client-side chat engine: relay transport + local store + UI event sink.
pub struct ChatClient<R: RelayTransport> {
    relay: R,
    db: Mutex<Database>,
    user_id: String,
    events: Option<UnboundedSender<UiEvent>>,
    /// Chats with a response currently streaming. A second send into one of
    /// these is rejected instead of interleaving two replies.
    active: Mutex<HashSet<Uuid>>,
}

impl<R: RelayTransport> ChatClient<R> {
    pub fn new(relay: R, db: Database, user_id: impl Into<String>) -> Self {
        Self {
            relay,
            db: Mutex::new(db),
            user_id: user_id.into(),
            events: None,
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Attach a UI event sink.
    pub fn with_events(mut self, events: UnboundedSender<UiEvent>) -> Self {
        self.events = Some(events);
        self
    }

    // ------------------------------------------------------------------
    // Session access
    // ------------------------------------------------------------------

    /// This user's chats, most recently active first.
    pub fn list_chats(&self) -> Result<Vec<ChatSession>, ClientError> {
        Ok(self.db()?.list_chats_for_user(&self.user_id)?)
    }

    /// Every message of a chat, oldest first.
    pub fn history(&self, chat_id: Uuid) -> Result<Vec<ChatMessage>, ClientError> {
        Ok(self.db()?.get_messages_by_chat(chat_id)?)
    }

    pub fn rename_chat(&self, chat_id: Uuid, title: &str) -> Result<(), ClientError> {
        Ok(self.db()?.rename_chat(chat_id, title)?)
    }

    /// Delete a chat and its messages. User-initiated only.
    pub fn delete_chat(&self, chat_id: Uuid) -> Result<bool, ClientError> {
        Ok(self.db()?.delete_chat(chat_id)?)
    }

    // ------------------------------------------------------------------
    // Send flow
    // ------------------------------------------------------------------

    /// Send one user message and stream the assistant reply to completion.
    ///
    /// With `chat_id` `None` a new chat is created, titled by the keyword
    /// heuristic over the first message. `cancel` aborts the reply stream;
    /// the outbound message always stays persisted.
    pub async fn send_message(
        &self,
        chat_id: Option<Uuid>,
        text: &str,
        cancel: CancelHandle,
    ) -> Result<SendResult, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let chat_id = match chat_id {
            Some(id) => {
                // Fail fast on a stale id instead of inserting orphans.
                self.db()?.get_chat(id)?;
                id
            }
            None => self.create_chat_for(text)?,
        };

        let _turn = self.claim_turn(chat_id)?;

        let request = ChatRelayRequest {
            message: text.to_string(),
            conversation_id: Some(chat_id),
            user_id: Some(self.user_id.clone()),
        };

        let stream = match self.relay.open_stream(&request).await {
            Ok(stream) => stream,
            Err(TransportError::Connect(reason)) => {
                debug!(%chat_id, %reason, "relay unreachable, queueing message");
                return self.save_offline(chat_id, text);
            }
            Err(other) => return Err(other.into()),
        };

        let user_message = self.persist_user_message(chat_id, text, false)?;

        emit(
            self.events.as_ref(),
            UiEvent::AssistantPlaceholder {
                chat_id,
                message_id: PLACEHOLDER_MESSAGE_ID,
            },
        );

        let events = self.events.as_ref();
        let outcome = run_turn(stream, cancel, |content| {
            emit(
                events,
                UiEvent::AssistantDelta {
                    chat_id,
                    content: content.to_string(),
                },
            );
        })
        .await;

        match outcome {
            TurnOutcome::Finalized(reply) => {
                let message_id =
                    self.persist_assistant_message(chat_id, &reply, user_message.created_at)?;
                emit(
                    self.events.as_ref(),
                    UiEvent::AssistantCompleted { chat_id, message_id },
                );
                Ok(SendResult::Completed { chat_id, message_id })
            }
            TurnOutcome::Cancelled => {
                info!(%chat_id, "turn cancelled by user");
                emit(self.events.as_ref(), UiEvent::TurnCancelled { chat_id });
                Ok(SendResult::Cancelled { chat_id })
            }
            TurnOutcome::Failed(error) => {
                warn!(%chat_id, %error, "turn failed");
                emit(
                    self.events.as_ref(),
                    UiEvent::TurnFailed {
                        chat_id,
                        error: error.clone(),
                    },
                );
                Err(ClientError::Stream(error))
            }
        }
    }

    /// Replay messages saved while offline, oldest first. Stops at the
    /// first message for which the relay is still unreachable. Returns how
    /// many messages were synced.
    pub async fn sync_outbox(&self) -> Result<usize, ClientError> {
        let pending = self.db()?.list_pending_sync()?;
        if pending.is_empty() {
            return Ok(0);
        }
        info!(count = pending.len(), "replaying offline outbox");

        let mut synced = 0;
        for message in pending {
            let request = ChatRelayRequest {
                message: message.content.clone(),
                conversation_id: Some(message.chat_id),
                user_id: Some(self.user_id.clone()),
            };

            let stream = match self.relay.open_stream(&request).await {
                Ok(stream) => stream,
                Err(TransportError::Connect(reason)) => {
                    debug!(%reason, "still offline, keeping outbox");
                    break;
                }
                Err(other) => return Err(other.into()),
            };

            match run_turn(stream, CancelHandle::new(), |_| {}).await {
                TurnOutcome::Finalized(reply) => {
                    self.persist_assistant_message(
                        message.chat_id,
                        &reply,
                        message.created_at,
                    )?;
                    self.db()?.mark_message_synced(message.id)?;
                    synced += 1;
                }
                TurnOutcome::Failed(error) => {
                    // Leave it queued for the next attempt.
                    warn!(message_id = %message.id, %error, "outbox replay failed");
                }
                TurnOutcome::Cancelled => {}
            }
        }
        Ok(synced)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn db(&self) -> Result<MutexGuard<'_, Database>, ClientError> {
        self.db
            .lock()
            .map_err(|_| ClientError::Internal("store lock poisoned".to_string()))
    }

    fn create_chat_for(&self, first_message: &str) -> Result<Uuid, ClientError> {
        let now = Utc::now();
        let chat = ChatSession {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            title: suggest_title(&[first_message]),
            last_message_at: now,
            created_at: now,
        };
        self.db()?.create_chat(&chat)?;

        emit(
            self.events.as_ref(),
            UiEvent::ChatCreated {
                chat_id: chat.id,
                title: chat.title,
            },
        );
        Ok(chat.id)
    }

    fn claim_turn(&self, chat_id: Uuid) -> Result<ActiveTurn<'_>, ClientError> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| ClientError::Internal("active set lock poisoned".to_string()))?;
        if !active.insert(chat_id) {
            return Err(ClientError::TurnInFlight);
        }
        Ok(ActiveTurn {
            set: &self.active,
            chat_id,
        })
    }

    fn persist_user_message(
        &self,
        chat_id: Uuid,
        text: &str,
        pending_sync: bool,
    ) -> Result<ChatMessage, ClientError> {
        let mut message = ChatMessage::text(chat_id, Role::User, text);
        message.pending_sync = pending_sync;

        let db = self.db()?;
        db.insert_message(&message)?;
        db.touch_chat(chat_id, message.created_at)?;
        Ok(message)
    }

    fn persist_assistant_message(
        &self,
        chat_id: Uuid,
        reply: &str,
        prompt_at: chrono::DateTime<Utc>,
    ) -> Result<Uuid, ClientError> {
        let mut message = ChatMessage::text(chat_id, Role::Assistant, reply);
        // Clock granularity can stamp the reply equal to its prompt; the
        // reply must always read back after it.
        if message.created_at <= prompt_at {
            message.created_at = prompt_at + chrono::Duration::milliseconds(1);
        }

        let db = self.db()?;
        db.insert_message(&message)?;
        db.touch_chat(chat_id, message.created_at)?;
        Ok(message.id)
    }

    fn save_offline(&self, chat_id: Uuid, text: &str) -> Result<SendResult, ClientError> {
        let message = self.persist_user_message(chat_id, text, true)?;
        emit(
            self.events.as_ref(),
            UiEvent::Notice {
                kind: NoticeKind::Info,
                text: "You're offline. The message was saved and will be sent later."
                    .to_string(),
            },
        );
        Ok(SendResult::SavedOffline {
            chat_id,
            message_id: message.id,
        })
    }
}

/// Removes the chat from the active set when the turn settles, including
/// on early returns and panics.
struct ActiveTurn<'a> {
    set: &'a Mutex<HashSet<Uuid>>,
    chat_id: Uuid,
}

impl Drop for ActiveTurn<'_> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.set.lock() {
            active.remove(&self.chat_id);
        }
    }
}
