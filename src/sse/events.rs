//! Frame and action types.
//!
//! A [`Frame`] is one complete `data:` line as cut by the parser. Decoding
//! turns it into a [`DecodedFrame`], and the interpreter maps that to
//! [`StreamAction`]s.

use thiserror::Error;

use super::payloads::WirePayload;
use crate::models::{Attachment, StatusKind};

/// One complete frame as cut from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Payload text after the prefix marker, not yet JSON-decoded
    Data(String),
    /// The reserved terminal token
    Terminal,
}

/// A frame after JSON decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFrame {
    Payload(WirePayload),
    Terminal,
}

/// A single frame could not be decoded. Never fatal: the frame is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid JSON frame ({message}): {snippet}")]
pub struct FrameDecodeError {
    /// Start of the offending payload, for logs
    pub snippet: String,
    pub message: String,
}

impl FrameDecodeError {
    const SNIPPET_CHARS: usize = 80;

    pub fn new(payload: &str, err: &serde_json::Error) -> Self {
        Self {
            snippet: payload.chars().take(Self::SNIPPET_CHARS).collect(),
            message: err.to_string(),
        }
    }
}

/// Semantic action derived from a decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamAction {
    /// Text to coalesce into the open assistant message
    ContentDelta(String),
    /// Progress note
    StatusMessage { kind: StatusKind, text: String },
    /// The service paused and needs the current document
    ToolCallRequest {
        tool_call_id: String,
        agent_context: serde_json::Value,
    },
    /// Attachments for the nearest assistant message
    AttachmentBatch(Vec<Attachment>),
    /// The reply is complete
    Completion,
    /// The service reported a failure
    ErrorEvent(String),
    /// New editor content, routed to the editor surface
    DocumentUpdate(String),
}

impl StreamAction {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            StreamAction::ContentDelta(_) => "content_delta",
            StreamAction::StatusMessage { .. } => "status_message",
            StreamAction::ToolCallRequest { .. } => "tool_call_request",
            StreamAction::AttachmentBatch(_) => "attachment_batch",
            StreamAction::Completion => "completion",
            StreamAction::ErrorEvent(_) => "error_event",
            StreamAction::DocumentUpdate(_) => "document_update",
        }
    }
}
