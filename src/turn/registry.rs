//! At most one active turn per session.
//!
//! The registry owns each session's conversation and the render feed shared
//! by all turns. Starting a turn supersedes whatever the session was still
//! running; [`SessionStreamRegistry::try_start`] refuses instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use super::controller::{TurnController, TurnHandle, TurnRequest};
use super::events::{create_event_channel, TurnEvent, TurnEventSender};
use super::state::{lock_conversation, SharedConversation, Turn};
use crate::error::{ParlorResult, TurnError};
use crate::models::{Conversation, Message, TurnStatus};

/// Capacity of the render feed.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct SessionEntry {
    conversation: SharedConversation,
    active: Option<Arc<Turn>>,
}

type Sessions = Arc<Mutex<HashMap<String, SessionEntry>>>;

fn lock_sessions(sessions: &Sessions) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    sessions
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registry of sessions and their active turns.
///
/// # Example
///
/// ```ignore
/// use parlor::turn::{SessionStreamRegistry, TurnController, Collaborators};
///
/// let registry = SessionStreamRegistry::new(controller);
/// let mut feed = registry.subscribe();
/// let handle = registry.start("session-1", "Summarize this", vec![]);
/// let outcome = handle.wait().await;
/// ```
#[derive(Clone)]
pub struct SessionStreamRegistry {
    controller: TurnController,
    sessions: Sessions,
    events: TurnEventSender,
}

impl SessionStreamRegistry {
    pub fn new(controller: TurnController) -> Self {
        let (events, _) = create_event_channel(EVENT_CHANNEL_CAPACITY);
        Self {
            controller,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    /// Render feed of every turn started through this registry.
    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }

    /// Start a turn, silently aborting the session's current one.
    pub fn start(
        &self,
        session_id: &str,
        prompt: impl Into<String>,
        attachments: Vec<crate::models::Attachment>,
    ) -> TurnHandle {
        let request = TurnRequest::new(session_id, prompt).with_attachments(attachments);
        let mut sessions = lock_sessions(&self.sessions);
        let entry = sessions.entry(session_id.to_string()).or_default();

        if let Some(previous) = entry.active.take() {
            if previous.abort() {
                tracing::info!(
                    session_id,
                    turn_id = %previous.id(),
                    "Superseding active turn"
                );
            }
        }

        self.launch(entry, request)
    }

    /// Start a turn unless the session already has one that has not ended.
    pub fn try_start(
        &self,
        session_id: &str,
        prompt: impl Into<String>,
        attachments: Vec<crate::models::Attachment>,
    ) -> ParlorResult<TurnHandle> {
        let request = TurnRequest::new(session_id, prompt).with_attachments(attachments);
        let mut sessions = lock_sessions(&self.sessions);
        let entry = sessions.entry(session_id.to_string()).or_default();

        if let Some(active) = &entry.active {
            if !active.status().is_terminal() {
                return Err(TurnError::SessionBusy {
                    session_id: session_id.to_string(),
                });
            }
        }

        Ok(self.launch(entry, request))
    }

    /// Called with the sessions lock held, so no other start can interleave.
    fn launch(&self, entry: &mut SessionEntry, request: TurnRequest) -> TurnHandle {
        let handle = self
            .controller
            .start(request, entry.conversation.clone(), self.events.clone());
        entry.active = Some(handle.turn().clone());
        self.release_when_finished(handle.turn());
        handle
    }

    /// Drop the session's entry for `turn` once it reaches a terminal state,
    /// unless a newer turn has taken its place.
    fn release_when_finished(&self, turn: &Arc<Turn>) {
        let sessions = self.sessions.clone();
        let session_id = turn.session_id().to_string();
        let turn_id = turn.id().to_string();
        let mut status = turn.subscribe();

        tokio::spawn(async move {
            loop {
                let finished = status.borrow().is_terminal();
                if finished {
                    break;
                }
                if status.changed().await.is_err() {
                    break;
                }
            }

            let mut sessions = lock_sessions(&sessions);
            if let Some(entry) = sessions.get_mut(&session_id) {
                if entry.active.as_ref().map_or(false, |t| t.id() == turn_id) {
                    entry.active = None;
                    tracing::debug!(
                        session_id = %session_id,
                        turn_id = %turn_id,
                        "Released finished turn"
                    );
                }
            }
        });
    }

    /// Abort the session's active turn. Returns false if there was none.
    pub fn abort(&self, session_id: &str) -> bool {
        let active = lock_sessions(&self.sessions)
            .get_mut(session_id)
            .and_then(|entry| entry.active.take());
        match active {
            Some(turn) => turn.abort(),
            None => false,
        }
    }

    /// Status of the session's active turn, if any.
    pub fn active_status(&self, session_id: &str) -> Option<TurnStatus> {
        lock_sessions(&self.sessions)
            .get(session_id)
            .and_then(|entry| entry.active.as_ref())
            .map(|turn| turn.status())
    }

    /// Id of the session's active turn, if any.
    pub fn active_turn_id(&self, session_id: &str) -> Option<String> {
        lock_sessions(&self.sessions)
            .get(session_id)
            .and_then(|entry| entry.active.as_ref())
            .map(|turn| turn.id().to_string())
    }

    /// The session's conversation, created empty on first use.
    pub fn conversation(&self, session_id: &str) -> SharedConversation {
        lock_sessions(&self.sessions)
            .entry(session_id.to_string())
            .or_default()
            .conversation
            .clone()
    }

    /// Snapshot of the session's messages.
    pub fn messages(&self, session_id: &str) -> Vec<Message> {
        let conversation = self.conversation(session_id);
        let messages = lock_conversation(&conversation).messages().to_vec();
        messages
    }

    /// Forget a session and its conversation, aborting its turn.
    pub fn remove(&self, session_id: &str) -> Option<Conversation> {
        let entry = lock_sessions(&self.sessions).remove(session_id)?;
        if let Some(turn) = entry.active {
            turn.abort();
        }
        let conversation = lock_conversation(&entry.conversation).clone();
        Some(conversation)
    }
}
