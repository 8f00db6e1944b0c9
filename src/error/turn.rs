//! Turn-level error types.
//!
//! A `TurnError` is what terminates a turn (or rejects starting one). Frame
//! decode failures never reach this level; they are absorbed by the parser.

use thiserror::Error;

use super::collaborator::CollaboratorError;
use super::transport::TransportError;
use crate::models::TurnStatus;

/// Errors that end a turn or reject an operation on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// Connection drop or failure while opening/reading the stream.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The document surface could not provide content for a tool call.
    #[error("Failed to fetch tool context: {0}")]
    ToolContextFetch(#[source] CollaboratorError),

    /// The server broke the streaming protocol (second concurrent tool call,
    /// content after completion).
    #[error("Protocol violation: {reason}")]
    ProtocolViolation { reason: String },

    /// The server reported an error inside the stream.
    #[error("Server reported an error: {reason}")]
    Server { reason: String },

    /// A turn is already active for this session and supersession was not requested.
    #[error("Session {session_id} already has an active turn")]
    SessionBusy { session_id: String },

    /// Attempted to move a turn along an edge the lifecycle does not allow.
    #[error("Invalid turn transition from {from} to {to}")]
    InvalidTransition { from: TurnStatus, to: TurnStatus },
}

impl TurnError {
    /// Create a protocol violation error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        TurnError::ProtocolViolation {
            reason: reason.into(),
        }
    }

    /// Whether this error moves the turn into the `error` state.
    ///
    /// `SessionBusy` and `InvalidTransition` are API misuse reported to the
    /// caller; they never change an existing turn.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TurnError::SessionBusy { .. } | TurnError::InvalidTransition { .. }
        )
    }

    /// Short error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            TurnError::Transport(err) => err.error_code(),
            TurnError::ToolContextFetch(_) => "E_TURN_TOOL_CONTEXT",
            TurnError::ProtocolViolation { .. } => "E_TURN_PROTOCOL",
            TurnError::Server { .. } => "E_TURN_SERVER",
            TurnError::SessionBusy { .. } => "E_TURN_BUSY",
            TurnError::InvalidTransition { .. } => "E_TURN_TRANSITION",
        }
    }

    /// Text appended to the conversation as an error message.
    pub fn user_message(&self) -> String {
        match self {
            TurnError::Transport(err) => err.user_message(),
            TurnError::ToolContextFetch(CollaboratorError::NoSurface) => {
                "Could not read the document: no editor is open.".to_string()
            }
            TurnError::ToolContextFetch(err) => {
                format!("Could not read the document: {}", err)
            }
            TurnError::ProtocolViolation { .. } => {
                "The assistant sent an unexpected response. Please resubmit your message."
                    .to_string()
            }
            TurnError::Server { reason } => format!("Assistant error: {}", reason),
            TurnError::SessionBusy { .. } => {
                "Please wait for the current response to complete before sending another message."
                    .to_string()
            }
            TurnError::InvalidTransition { from, to } => {
                format!("Internal error: cannot move turn from {} to {}", from, to)
            }
        }
    }
}
