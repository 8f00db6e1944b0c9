//! Render feed published while turns run.
//!
//! Every model mutation, status change and document update is broadcast as a
//! [`TurnEvent`] so a front-end can redraw incrementally without polling the
//! conversation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{Message, TurnStatus};

/// Type alias for the turn event sender.
pub type TurnEventSender = broadcast::Sender<TurnEvent>;

/// Create a turn event channel with the given capacity.
///
/// Slow receivers lag and skip events instead of blocking the turn.
pub fn create_event_channel(capacity: usize) -> (TurnEventSender, broadcast::Receiver<TurnEvent>) {
    broadcast::channel(capacity)
}

/// One observable change made by a turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub turn_id: String,
    pub kind: TurnEventKind,
}

impl TurnEvent {
    pub fn new(session_id: &str, turn_id: &str, kind: TurnEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            turn_id: turn_id.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEventKind {
    /// A message was pushed onto the conversation
    MessageAppended { index: usize, message: Message },
    /// A message was changed in place (delta, attachments, closed)
    MessageUpdated { index: usize, message: Message },
    StatusChanged { status: TurnStatus },
    /// Content handed to the editor surface
    DocumentUpdated { content: String },
}
