//! Turn lifecycle.
//!
//! [`TurnController::start`] records the prompt, then spawns one task that
//! opens the stream and applies each frame before reading the next. The
//! caller gets a [`TurnHandle`] for observing, aborting and awaiting it.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::events::{TurnEventKind, TurnEventSender};
use super::state::{lock_conversation, Halt, SharedConversation, Turn};
use super::tool_round_trip::{ToolCallContext, ToolRoundTrip};
use crate::adapters::{FileDocumentSurface, LogMessageStore, NoopUploader};
use crate::config::ClientConfig;
use crate::error::{CollaboratorError, TransportError, TurnError};
use crate::models::{
    Attachment, Conversation, MessageRole, ModelChange, OutboundRequest, StreamRequest,
    TurnStatus,
};
use crate::sse::{frame_stream, interpret, DecodedFrame, FrameStream, StreamAction};
use crate::traits::{
    AttachmentUploader, DocumentSurface, EditorSurface, MessageStore, StreamTransport,
};

/// The components a turn talks to besides the transport.
#[derive(Clone)]
pub struct Collaborators {
    pub document: Arc<dyn DocumentSurface>,
    pub editor: Arc<dyn EditorSurface>,
    pub store: Arc<dyn MessageStore>,
    pub uploader: Arc<dyn AttachmentUploader>,
}

impl Collaborators {
    pub fn new(
        document: Arc<dyn DocumentSurface>,
        editor: Arc<dyn EditorSurface>,
        store: Arc<dyn MessageStore>,
        uploader: Arc<dyn AttachmentUploader>,
    ) -> Self {
        Self {
            document,
            editor,
            store,
            uploader,
        }
    }

    pub fn with_document(mut self, document: Arc<dyn DocumentSurface>) -> Self {
        self.document = document;
        self
    }

    pub fn with_editor(mut self, editor: Arc<dyn EditorSurface>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn AttachmentUploader>) -> Self {
        self.uploader = uploader;
        self
    }
}

impl Default for Collaborators {
    /// No document, log-only persistence, no uploads.
    fn default() -> Self {
        let surface = Arc::new(FileDocumentSurface::detached());
        Self {
            document: surface.clone(),
            editor: surface,
            store: Arc::new(LogMessageStore),
            uploader: Arc::new(NoopUploader),
        }
    }
}

/// How long a stream left open after completion is still read for logging.
pub const LATE_FRAME_GRACE: Duration = Duration::from_secs(2);

/// What the user sent to open a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub session_id: String,
    pub prompt: String,
    pub attachments: Vec<Attachment>,
}

impl TurnRequest {
    pub fn new(session_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            prompt: prompt.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub turn_id: String,
    pub session_id: String,
    pub status: TurnStatus,
    /// Set when the turn ended in `error`
    pub error: Option<TurnError>,
}

impl TurnOutcome {
    pub fn is_done(&self) -> bool {
        self.status == TurnStatus::Done
    }
}

/// Handle to a running turn.
#[derive(Debug)]
pub struct TurnHandle {
    turn: Arc<Turn>,
    task: JoinHandle<TurnOutcome>,
}

impl TurnHandle {
    pub fn id(&self) -> &str {
        self.turn.id()
    }

    pub fn session_id(&self) -> &str {
        self.turn.session_id()
    }

    pub fn status(&self) -> TurnStatus {
        self.turn.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<TurnStatus> {
        self.turn.subscribe()
    }

    /// See [`Turn::abort`].
    pub fn abort(&self) -> bool {
        self.turn.abort()
    }

    pub fn turn(&self) -> &Arc<Turn> {
        &self.turn
    }

    /// Wait for the turn task to finish.
    pub async fn wait(self) -> TurnOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(turn_id = %self.turn.id(), "Turn task failed: {}", err);
                TurnOutcome {
                    turn_id: self.turn.id().to_string(),
                    session_id: self.turn.session_id().to_string(),
                    status: self.turn.status(),
                    error: None,
                }
            }
        }
    }
}

/// Starts turns against one service endpoint.
#[derive(Clone)]
pub struct TurnController {
    config: Arc<ClientConfig>,
    transport: Arc<dyn StreamTransport>,
    collaborators: Collaborators,
}

impl TurnController {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn StreamTransport>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            collaborators,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Append the prompt and a streaming placeholder, then run the turn on
    /// its own task.
    ///
    /// The caller must make sure no other turn of the session is still
    /// writing to `conversation`; [`SessionStreamRegistry`] does this.
    ///
    /// [`SessionStreamRegistry`]: super::registry::SessionStreamRegistry
    pub fn start(
        &self,
        request: TurnRequest,
        conversation: SharedConversation,
        events: TurnEventSender,
    ) -> TurnHandle {
        let turn = Arc::new(Turn::new(request.session_id.clone(), conversation, events));

        {
            let mut conversation = lock_conversation(turn.conversation());
            // Close whatever an aborted predecessor left open
            for index in conversation.finalize() {
                turn.publish(&conversation, ModelChange::Updated(index));
            }
            let change =
                conversation.append_user_message(request.prompt.clone(), request.attachments.clone());
            turn.publish(&conversation, change);
            let change = conversation.append_streaming_placeholder();
            turn.publish(&conversation, change);
            if let Err(err) = turn.transition(TurnStatus::Streaming) {
                tracing::warn!("Fresh turn refused to start streaming: {}", err);
            }
        }

        tracing::info!(
            turn_id = %turn.id(),
            session_id = %turn.session_id(),
            "Turn started"
        );

        let run = TurnRun {
            turn: turn.clone(),
            config: self.config.clone(),
            transport: self.transport.clone(),
            collaborators: self.collaborators.clone(),
            request,
        };
        let task = tokio::spawn(run.execute());

        TurnHandle { turn, task }
    }
}

/// POST `request` and wrap the reply body in a frame stream.
pub(crate) async fn open_stream(
    turn: &Turn,
    transport: &dyn StreamTransport,
    config: &ClientConfig,
    request: &OutboundRequest,
) -> Result<FrameStream, Halt> {
    let body = serde_json::to_string(request).map_err(|err| {
        TurnError::Transport(TransportError::Other(format!(
            "Failed to encode request: {}",
            err
        )))
    })?;
    let url = config.stream_url();
    let headers = config.request_headers();

    tracing::debug!(
        turn_id = %turn.id(),
        continuation = request.is_continuation(),
        "Opening stream: {}",
        url
    );

    let bytes = tokio::select! {
        biased;
        _ = turn.cancellation().cancelled() => return Err(Halt::Aborted),
        result = transport.post_stream(&url, &body, &headers) => result.map_err(TurnError::from)?,
    };

    Ok(frame_stream(bytes, config.frame_parser()))
}

/// State of the task driving one turn.
struct TurnRun {
    turn: Arc<Turn>,
    config: Arc<ClientConfig>,
    transport: Arc<dyn StreamTransport>,
    collaborators: Collaborators,
    request: TurnRequest,
}

/// What the frame loop does after one action.
enum Step {
    Continue,
    ToolCall(ToolCallContext),
    Complete,
}

impl TurnRun {
    async fn execute(self) -> TurnOutcome {
        self.spawn_side_tasks();

        let error = match self.drive().await {
            Ok(()) => None,
            Err(Halt::Aborted) => {
                tracing::debug!(turn_id = %self.turn.id(), "Turn task stopped after abort");
                None
            }
            Err(Halt::Failed(err)) => {
                self.fail(&err);
                Some(err)
            }
        };

        TurnOutcome {
            turn_id: self.turn.id().to_string(),
            session_id: self.turn.session_id().to_string(),
            status: self.turn.status(),
            error,
        }
    }

    async fn drive(&self) -> Result<(), Halt> {
        let document_content = if self.config.include_document_on_start {
            self.initial_document().await?
        } else {
            None
        };

        let request = OutboundRequest::Start(
            StreamRequest::new(&self.request.session_id, &self.request.prompt)
                .with_document_content(document_content),
        );
        let mut frames =
            open_stream(&self.turn, self.transport.as_ref(), &self.config, &request).await?;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.turn.cancellation().cancelled() => return Err(Halt::Aborted),
                next = frames.next() => next,
            };

            match next {
                Some(Ok(DecodedFrame::Terminal)) => return self.finish(),
                Some(Ok(DecodedFrame::Payload(payload))) => {
                    for action in interpret(&payload) {
                        match self.apply(action).await? {
                            Step::Continue => {}
                            Step::ToolCall(context) => {
                                frames = self.round_trip(context, frames).await?;
                            }
                            Step::Complete => {
                                self.finish()?;
                                self.watch_late_frames(frames);
                                return Ok(());
                            }
                        }
                    }
                }
                Some(Err(err)) => return Err(TurnError::from(err).into()),
                None => return Err(TurnError::from(TransportError::StreamClosed).into()),
            }
        }
    }

    /// Apply one action and tell the frame loop how to go on.
    async fn apply(&self, action: StreamAction) -> Result<Step, Halt> {
        match action {
            StreamAction::ContentDelta(text) => {
                self.mutate(|conversation| conversation.apply_content_delta(&text))?;
            }
            StreamAction::StatusMessage { kind, text } => {
                self.mutate(|conversation| {
                    conversation.clear_anchor();
                    conversation.append_status(kind, text)
                })?;
            }
            StreamAction::AttachmentBatch(attachments) => {
                self.mutate(|conversation| conversation.attach_to_last_assistant(attachments))?;
            }
            StreamAction::Completion => {
                tracing::debug!(turn_id = %self.turn.id(), "Completion received");
                return Ok(Step::Complete);
            }
            StreamAction::ErrorEvent(reason) => {
                return Err(TurnError::Server { reason }.into());
            }
            StreamAction::DocumentUpdate(content) => self.update_document(content).await?,
            StreamAction::ToolCallRequest {
                tool_call_id,
                agent_context,
            } => {
                return Ok(Step::ToolCall(ToolCallContext {
                    tool_call_id,
                    original_prompt: self.request.prompt.clone(),
                    session_id: self.request.session_id.clone(),
                    agent_context,
                }));
            }
        }
        Ok(Step::Continue)
    }

    fn mutate<F>(&self, f: F) -> Result<(), Halt>
    where
        F: FnOnce(&mut Conversation) -> ModelChange,
    {
        let mut conversation = self.turn.lock_active().ok_or(Halt::Aborted)?;
        let change = f(&mut conversation);
        self.turn.publish(&conversation, change);
        Ok(())
    }

    async fn round_trip(
        &self,
        context: ToolCallContext,
        paused: FrameStream,
    ) -> Result<FrameStream, Halt> {
        ToolRoundTrip {
            turn: &self.turn,
            transport: self.transport.as_ref(),
            document: self.collaborators.document.as_ref(),
            config: &self.config,
        }
        .run(context, paused)
        .await
    }

    async fn update_document(&self, content: String) -> Result<(), Halt> {
        let result = tokio::select! {
            biased;
            _ = self.turn.cancellation().cancelled() => return Err(Halt::Aborted),
            result = self.collaborators.editor.apply_update(&content) => result,
        };

        match result {
            Ok(()) => {
                let _conversation = self.turn.lock_active().ok_or(Halt::Aborted)?;
                self.turn.emit(TurnEventKind::DocumentUpdated { content });
            }
            Err(err) => tracing::warn!(turn_id = %self.turn.id(), "Document update failed: {}", err),
        }
        Ok(())
    }

    /// Best-effort read of the document to send with the first request.
    async fn initial_document(&self) -> Result<Option<String>, Halt> {
        let result = tokio::select! {
            biased;
            _ = self.turn.cancellation().cancelled() => return Err(Halt::Aborted),
            result = self.collaborators.document.current_content() => result,
        };

        match result {
            Ok(content) => Ok(Some(content)),
            Err(CollaboratorError::NoSurface) => Ok(None),
            Err(err) => {
                tracing::warn!("Sending prompt without document: {}", err);
                Ok(None)
            }
        }
    }

    /// Close the reply, move to `done` and persist it.
    fn finish(&self) -> Result<(), Halt> {
        let reply = {
            let mut conversation = self.turn.lock_active().ok_or(Halt::Aborted)?;
            for index in conversation.finalize() {
                self.turn.publish(&conversation, ModelChange::Updated(index));
            }
            self.turn.transition(TurnStatus::Done)?;
            conversation.current_reply()
        };

        tracing::info!(turn_id = %self.turn.id(), "Turn completed");
        self.persist(MessageRole::Assistant, reply);
        Ok(())
    }

    /// Keep reading a stream the service left open after completion.
    ///
    /// The turn is already `done`, so late frames never reach the
    /// conversation. A content-bearing frame is logged as a protocol
    /// violation and closes the stream, as do abort and the grace period.
    fn watch_late_frames(&self, frames: FrameStream) {
        let turn_id = self.turn.id().to_string();
        let cancel = self.turn.cancellation().clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                result = tokio::time::timeout(LATE_FRAME_GRACE, log_late_frames(&turn_id, frames)) => {
                    if result.is_err() {
                        tracing::debug!(turn_id = %turn_id, "Closing stream left open after completion");
                    }
                }
            }
        });
    }

    /// Record `err` in the conversation and move to `error`.
    fn fail(&self, err: &TurnError) {
        match err {
            TurnError::ProtocolViolation { reason } => {
                tracing::error!(turn_id = %self.turn.id(), "Protocol violation: {}", reason);
            }
            _ => tracing::warn!(
                turn_id = %self.turn.id(),
                code = err.error_code(),
                "Turn failed: {}",
                err
            ),
        }

        let Some(mut conversation) = self.turn.lock_active() else {
            return;
        };
        for index in conversation.finalize() {
            self.turn.publish(&conversation, ModelChange::Updated(index));
        }
        let change = conversation.append_error(err.user_message());
        self.turn.publish(&conversation, change);
        if let Err(transition) = self.turn.transition(TurnStatus::Error) {
            tracing::debug!("{}", transition);
        }
    }

    fn spawn_side_tasks(&self) {
        self.persist(MessageRole::User, self.request.prompt.clone());

        for attachment in &self.request.attachments {
            let uploader = self.collaborators.uploader.clone();
            let session_id = self.request.session_id.clone();
            let attachment = attachment.clone();
            tokio::spawn(async move {
                if let Err(err) = uploader.upload(&session_id, &attachment).await {
                    tracing::warn!("Upload of {} failed: {}", attachment.name, err);
                }
            });
        }
    }

    /// Fire-and-forget save.
    fn persist(&self, role: MessageRole, content: String) {
        let store = self.collaborators.store.clone();
        let session_id = self.request.session_id.clone();
        tokio::spawn(async move {
            if let Err(err) = store.save_message(&session_id, role, &content).await {
                tracing::warn!("Failed to save {} message: {}", role, err);
            }
        });
    }
}

/// Read frames after completion until the stream ends or breaks protocol.
async fn log_late_frames(turn_id: &str, mut frames: FrameStream) {
    while let Some(frame) = frames.next().await {
        let payload = match frame {
            Ok(DecodedFrame::Payload(payload)) => payload,
            Ok(DecodedFrame::Terminal) | Err(_) => return,
        };
        for action in interpret(&payload) {
            if action != StreamAction::Completion {
                tracing::error!(
                    turn_id = %turn_id,
                    "Protocol violation: {} after completion",
                    action.kind()
                );
                return;
            }
        }
    }
}
