//! Mid-stream tool calls.
//!
//! When the service pauses to ask for the current document, the turn moves
//! to `awaiting-tool`, fetches the content from the [`DocumentSurface`] and
//! posts a continuation request. The reply stream of that request replaces
//! the paused one and keeps writing into the same assistant message.

use futures_util::StreamExt;

use super::controller::open_stream;
use super::state::{Halt, Turn};
use crate::config::ClientConfig;
use crate::error::{CollaboratorError, TurnError};
use crate::models::{ContinuationRequest, OutboundRequest, StatusKind, TurnStatus};
use crate::sse::{interpret, DecodedFrame, FrameStream, StreamAction};
use crate::traits::{DocumentSurface, StreamTransport};

/// Status shown while the document is being read.
pub const RETRIEVING_STATUS: &str = "Retrieving document content...";

/// Everything needed to answer one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallContext {
    pub tool_call_id: String,
    /// Prompt of the turn that triggered the call
    pub original_prompt: String,
    pub session_id: String,
    /// Opaque context to echo back
    pub agent_context: serde_json::Value,
}

impl ToolCallContext {
    /// Continuation request carrying `result` as the tool output.
    pub fn continuation(&self, result: impl Into<String>) -> ContinuationRequest {
        ContinuationRequest::new(
            self.session_id.clone(),
            self.tool_call_id.clone(),
            result,
            self.agent_context.clone(),
        )
    }
}

/// One tool round trip of a running turn.
pub(crate) struct ToolRoundTrip<'a> {
    pub turn: &'a Turn,
    pub transport: &'a dyn StreamTransport,
    pub document: &'a dyn DocumentSurface,
    pub config: &'a ClientConfig,
}

impl ToolRoundTrip<'_> {
    /// Answer the tool call and return the resumed frame stream.
    ///
    /// `paused` is read while the fetch is pending so that a second tool
    /// call or a server error on it is noticed. Anything else on it is
    /// discarded.
    pub async fn run(
        &self,
        context: ToolCallContext,
        paused: FrameStream,
    ) -> Result<FrameStream, Halt> {
        self.suspend()?;
        tracing::info!(
            turn_id = %self.turn.id(),
            tool_call_id = %context.tool_call_id,
            "Tool call: fetching document content"
        );

        let content = self
            .fetch(paused)
            .await?
            .map_err(TurnError::ToolContextFetch)?;

        let request = OutboundRequest::Continuation(context.continuation(content));
        let resumed = open_stream(self.turn, self.transport, self.config, &request).await?;

        let _conversation = self.turn.lock_active().ok_or(Halt::Aborted)?;
        self.turn.transition(TurnStatus::Streaming)?;
        tracing::info!(
            turn_id = %self.turn.id(),
            tool_call_id = %context.tool_call_id,
            "Tool call answered, stream resumed"
        );
        Ok(resumed)
    }

    /// Enter `awaiting-tool`, pin the assistant message and note the retrieval.
    fn suspend(&self) -> Result<(), Halt> {
        let mut conversation = self.turn.lock_active().ok_or(Halt::Aborted)?;
        self.turn.transition(TurnStatus::AwaitingTool)?;
        if let Some(change) = conversation.anchor_open_assistant() {
            self.turn.publish(&conversation, change);
        }
        let change = conversation.append_status(StatusKind::Tool, RETRIEVING_STATUS);
        self.turn.publish(&conversation, change);
        Ok(())
    }

    /// Race the document fetch against cancellation and the paused stream.
    async fn fetch(
        &self,
        mut paused: FrameStream,
    ) -> Result<Result<String, CollaboratorError>, Halt> {
        let cancel = self.turn.cancellation();
        let mut fetch = self.document.current_content();
        let mut paused_open = true;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(turn_id = %self.turn.id(), "Document fetch abandoned");
                    return Err(Halt::Aborted);
                }
                result = &mut fetch => return Ok(result),
                frame = paused.next(), if paused_open => match frame {
                    Some(Ok(frame)) => check_paused_frame(frame)?,
                    Some(Err(err)) => {
                        tracing::debug!("Paused stream closed with error: {}", err);
                        paused_open = false;
                    }
                    None => paused_open = false,
                },
            }
        }
    }
}

/// Frames arriving on a paused stream only matter if they break the protocol.
fn check_paused_frame(frame: DecodedFrame) -> Result<(), TurnError> {
    let DecodedFrame::Payload(payload) = frame else {
        return Ok(());
    };
    for action in interpret(&payload) {
        match action {
            StreamAction::ToolCallRequest { tool_call_id, .. } => {
                return Err(TurnError::protocol(format!(
                    "tool call {} arrived while another was outstanding",
                    tool_call_id
                )));
            }
            StreamAction::ErrorEvent(reason) => return Err(TurnError::Server { reason }),
            other => {
                tracing::debug!("Discarding {} while awaiting tool context", other.kind());
            }
        }
    }
    Ok(())
}
