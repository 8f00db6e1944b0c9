//! Maps decoded frames to stream actions.
//!
//! Priority, highest first:
//! 1. `needs_document_content` → tool call; every other field is ignored
//! 2. `done: true` → completion
//! 3. `error` → error event
//! 4. `attachments` (non-empty) → attachment batch, plus 5 when `content` is also set
//! 5. `content` (non-empty) → content delta
//! 6. `thinking_message`, else `tool_message` → status message
//!
//! `document_update` rides alongside and is emitted first. A payload with
//! nothing recognized yields no actions.

use super::events::{DecodedFrame, StreamAction};
use super::payloads::WirePayload;
use crate::models::StatusKind;

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Interpret one decoded frame.
pub fn interpret_frame(frame: &DecodedFrame) -> Vec<StreamAction> {
    match frame {
        DecodedFrame::Terminal => vec![StreamAction::Completion],
        DecodedFrame::Payload(payload) => interpret(payload),
    }
}

/// Interpret one payload into zero or more actions, in application order.
pub fn interpret(payload: &WirePayload) -> Vec<StreamAction> {
    if let Some(call) = payload.tool_call() {
        return vec![StreamAction::ToolCallRequest {
            tool_call_id: call.tool_call_id,
            agent_context: call.agent_context,
        }];
    }

    let mut actions = Vec::new();

    if let Some(update) = payload.document_update.as_ref() {
        actions.push(StreamAction::DocumentUpdate(update.clone()));
    }

    if payload.done == Some(true) {
        actions.push(StreamAction::Completion);
        return actions;
    }

    if let Some(reason) = non_empty(&payload.error) {
        actions.push(StreamAction::ErrorEvent(reason.to_string()));
        return actions;
    }

    let attachments = payload
        .attachments
        .as_ref()
        .filter(|list| !list.is_empty());
    if let Some(list) = attachments {
        actions.push(StreamAction::AttachmentBatch(list.clone()));
    }

    if let Some(text) = non_empty(&payload.content) {
        actions.push(StreamAction::ContentDelta(text.to_string()));
        return actions;
    }

    if attachments.is_some() {
        return actions;
    }

    if let Some(text) = non_empty(&payload.thinking_message) {
        actions.push(StreamAction::StatusMessage {
            kind: StatusKind::Thinking,
            text: text.to_string(),
        });
    } else if let Some(text) = non_empty(&payload.tool_message) {
        actions.push(StreamAction::StatusMessage {
            kind: StatusKind::Tool,
            text: text.to_string(),
        });
    }

    actions
}
