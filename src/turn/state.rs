//! Shared state of one turn.
//!
//! A [`Turn`] is shared between the task that drives it and every handle
//! observing it. Status lives in a watch channel so observers can await
//! changes. The conversation lock doubles as the turn's commit point: the
//! cancellation flag is checked under it before every mutation, and
//! [`Turn::abort`] flips the flag under it, so once `abort` returns the turn
//! never touches the conversation again.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::events::{TurnEvent, TurnEventKind, TurnEventSender};
use crate::error::TurnError;
use crate::models::{Conversation, ModelChange, TurnStatus};

/// Conversation shared by every turn of a session.
pub type SharedConversation = Arc<Mutex<Conversation>>;

/// Lock a conversation, recovering from a poisoned mutex.
pub fn lock_conversation(conversation: &SharedConversation) -> MutexGuard<'_, Conversation> {
    conversation
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct Turn {
    id: String,
    session_id: String,
    status: watch::Sender<TurnStatus>,
    cancel: CancellationToken,
    conversation: SharedConversation,
    events: TurnEventSender,
}

impl Turn {
    pub(crate) fn new(
        session_id: impl Into<String>,
        conversation: SharedConversation,
        events: TurnEventSender,
    ) -> Self {
        let (status, _) = watch::channel(TurnStatus::Idle);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            status,
            cancel: CancellationToken::new(),
            conversation,
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn status(&self) -> TurnStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<TurnStatus> {
        self.status.subscribe()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn conversation(&self) -> &SharedConversation {
        &self.conversation
    }

    /// Move to `next` if the lifecycle allows it.
    ///
    /// A rejected transition leaves the status unchanged.
    pub(crate) fn transition(&self, next: TurnStatus) -> Result<(), TurnError> {
        let mut rejected = None;
        self.status.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                rejected = Some(*current);
                false
            }
        });

        match rejected {
            Some(from) => Err(TurnError::InvalidTransition { from, to: next }),
            None => {
                tracing::debug!(turn_id = %self.id, "Turn status -> {}", next);
                self.emit(TurnEventKind::StatusChanged { status: next });
                Ok(())
            }
        }
    }

    /// Abort the turn.
    ///
    /// Status becomes `aborted` before this returns and no further
    /// conversation mutation from this turn happens afterwards. Returns
    /// false if the turn had already ended.
    pub fn abort(&self) -> bool {
        let _conversation = lock_conversation(&self.conversation);
        let aborted = self.transition(TurnStatus::Aborted).is_ok();
        self.cancel.cancel();
        if aborted {
            tracing::info!(turn_id = %self.id, session_id = %self.session_id, "Turn aborted");
        }
        aborted
    }

    /// Lock the conversation for a mutation, or `None` once the turn was
    /// cancelled. Hold the guard for the whole mutation.
    pub(crate) fn lock_active(&self) -> Option<MutexGuard<'_, Conversation>> {
        let conversation = lock_conversation(&self.conversation);
        if self.cancel.is_cancelled() {
            tracing::debug!(turn_id = %self.id, "Dropping mutation from cancelled turn");
            return None;
        }
        Some(conversation)
    }

    /// Publish a model change with a snapshot of the affected message.
    pub(crate) fn publish(&self, conversation: &Conversation, change: ModelChange) {
        let Some(message) = conversation.get(change.index()).cloned() else {
            return;
        };
        let kind = match change {
            ModelChange::Appended(index) => TurnEventKind::MessageAppended { index, message },
            ModelChange::Updated(index) => TurnEventKind::MessageUpdated { index, message },
        };
        self.emit(kind);
    }

    pub(crate) fn emit(&self, kind: TurnEventKind) {
        // No subscribers is fine
        let _ = self
            .events
            .send(TurnEvent::new(&self.session_id, &self.id, kind));
    }
}

/// Why a turn stopped before reaching `done`.
#[derive(Debug)]
pub(crate) enum Halt {
    /// Cancellation was observed; nothing more may be written
    Aborted,
    Failed(TurnError),
}

impl From<TurnError> for Halt {
    fn from(err: TurnError) -> Self {
        Halt::Failed(err)
    }
}
