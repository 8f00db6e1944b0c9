//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! let harness = Harness::new();
//! harness.transport.push(MockStream::frames(&[r#"{"content":"hi"}"#, "[DONE]"]));
//! let outcome = harness.registry.start(SESSION, "hello", vec![]).wait().await;
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use parlor::adapters::mock::{
    MockDocumentSurface, MockTransport, RecordingEditor, RecordingMessageStore, RecordingUploader,
};
use parlor::config::ClientConfig;
use parlor::models::{Message, MessageRole};
use parlor::turn::{Collaborators, SessionStreamRegistry, TurnController, TurnEvent, TurnEventKind};
use tokio::sync::broadcast;

pub const SESSION: &str = "session-under-test";

/// A registry wired to mocks, with the mocks kept for inspection.
pub struct Harness {
    pub transport: MockTransport,
    pub document: MockDocumentSurface,
    pub editor: RecordingEditor,
    pub store: RecordingMessageStore,
    pub uploader: RecordingUploader,
    pub registry: SessionStreamRegistry,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_document(MockDocumentSurface::detached())
    }

    pub fn with_document(document: MockDocumentSurface) -> Self {
        Self::build(ClientConfig::default(), document)
    }

    pub fn build(config: ClientConfig, document: MockDocumentSurface) -> Self {
        let transport = MockTransport::new();
        let editor = RecordingEditor::new();
        let store = RecordingMessageStore::new();
        let uploader = RecordingUploader::new();

        let collaborators = Collaborators::new(
            Arc::new(document.clone()),
            Arc::new(editor.clone()),
            Arc::new(store.clone()),
            Arc::new(uploader.clone()),
        );
        let registry = SessionStreamRegistry::new(TurnController::new(
            config,
            Arc::new(transport.clone()),
            collaborators,
        ));

        Self {
            transport,
            document,
            editor,
            store,
            uploader,
            registry,
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.registry.messages(SESSION)
    }

    /// `(role, content)` of every message, for compact assertions.
    pub fn transcript(&self) -> Vec<(MessageRole, String)> {
        self.messages()
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect()
    }
}

/// Receive events until one shows a message with exactly `content`.
pub async fn wait_for_content(feed: &mut broadcast::Receiver<TurnEvent>, content: &str) {
    loop {
        let event = feed.recv().await.expect("event feed closed");
        match event.kind {
            TurnEventKind::MessageAppended { message, .. }
            | TurnEventKind::MessageUpdated { message, .. }
                if message.content == content =>
            {
                return;
            }
            _ => {}
        }
    }
}

/// Yield until the transport has seen `count` requests.
pub async fn wait_for_requests(transport: &MockTransport, count: usize) {
    while transport.requests().len() < count {
        tokio::task::yield_now().await;
    }
}
