//! In-memory collaborators for testing.
//!
//! Each mock records what it was asked to do and can be told to fail.
//! [`MockDocumentSurface`] can also hold a fetch open until the test
//! releases it, to exercise cancellation during a tool round trip.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::error::CollaboratorError;
use crate::models::{Attachment, MessageRole};
use crate::traits::{AttachmentUploader, DocumentSurface, EditorSurface, MessageStore};

/// Document surface with scripted content.
#[derive(Debug, Clone)]
pub struct MockDocumentSurface {
    content: Arc<Mutex<Result<String, CollaboratorError>>>,
    /// When set, each fetch waits for a permit on this before answering
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
    fetches: Arc<Mutex<usize>>,
}

impl MockDocumentSurface {
    /// A surface that answers with `content`.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self::from_result(Ok(content.into()))
    }

    /// A surface with no editor attached.
    pub fn detached() -> Self {
        Self::from_result(Err(CollaboratorError::NoSurface))
    }

    fn from_result(result: Result<String, CollaboratorError>) -> Self {
        Self {
            content: Arc::new(Mutex::new(result)),
            gate: None,
            started: Arc::new(Notify::new()),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    /// Hold every fetch until [`MockDocumentSurface::release`] is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one held fetch complete.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Wait until a fetch has started.
    pub async fn fetch_started(&self) {
        self.started.notified().await;
    }

    pub fn set_content(&self, result: Result<String, CollaboratorError>) {
        *self.content.lock().unwrap() = result;
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl DocumentSurface for MockDocumentSurface {
    async fn current_content(&self) -> Result<String, CollaboratorError> {
        *self.fetches.lock().unwrap() += 1;
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.content.lock().unwrap().clone()
    }
}

/// Editor surface that records updates.
#[derive(Debug, Clone, Default)]
pub struct RecordingEditor {
    updates: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl EditorSurface for RecordingEditor {
    async fn apply_update(&self, content: &str) -> Result<(), CollaboratorError> {
        if *self.fail.lock().unwrap() {
            return Err(CollaboratorError::NoSurface);
        }
        self.updates.lock().unwrap().push(content.to_string());
        Ok(())
    }
}

/// A message handed to a [`RecordingMessageStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMessage {
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
}

/// Message store that records saves.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessageStore {
    saved: Arc<Mutex<Vec<SavedMessage>>>,
    fail: Arc<Mutex<bool>>,
    notify: Arc<Notify>,
}

impl RecordingMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<SavedMessage> {
        self.saved.lock().unwrap().clone()
    }

    /// Saves fail (after being attempted) while set.
    pub fn set_should_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Wait until at least `count` saves were attempted.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.saved.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl MessageStore for RecordingMessageStore {
    async fn save_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), CollaboratorError> {
        self.saved.lock().unwrap().push(SavedMessage {
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
        });
        self.notify.notify_waiters();
        if *self.fail.lock().unwrap() {
            return Err(CollaboratorError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

/// Uploader that records attachment names.
#[derive(Debug, Clone, Default)]
pub struct RecordingUploader {
    uploaded: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<bool>>,
    notify: Arc<Notify>,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Wait until at least `count` uploads were attempted.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.uploaded.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl AttachmentUploader for RecordingUploader {
    async fn upload(
        &self,
        _session_id: &str,
        attachment: &Attachment,
    ) -> Result<(), CollaboratorError> {
        self.uploaded.lock().unwrap().push(attachment.name.clone());
        self.notify.notify_waiters();
        if *self.fail.lock().unwrap() {
            return Err(CollaboratorError::Unavailable("upload rejected".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_surface_content() {
        let surface = MockDocumentSurface::with_content("doc");
        assert_eq!(surface.current_content().await.unwrap(), "doc");
        assert_eq!(surface.fetch_count(), 1);

        surface.set_content(Err(CollaboratorError::NoSurface));
        assert_eq!(
            surface.current_content().await,
            Err(CollaboratorError::NoSurface)
        );
    }

    #[tokio::test]
    async fn test_detached_surface() {
        let surface = MockDocumentSurface::detached();
        assert_eq!(
            surface.current_content().await,
            Err(CollaboratorError::NoSurface)
        );
    }

    #[tokio::test]
    async fn test_gated_surface_waits_for_release() {
        let surface = MockDocumentSurface::with_content("late").gated();
        let fetching = surface.clone();
        let task = tokio::spawn(async move { fetching.current_content().await });

        surface.fetch_started().await;
        assert!(!task.is_finished());

        surface.release();
        assert_eq!(task.await.unwrap().unwrap(), "late");
    }

    #[tokio::test]
    async fn test_editor_records_and_fails() {
        let editor = RecordingEditor::new();
        editor.apply_update("v1").await.unwrap();
        editor.set_should_fail(true);
        assert!(editor.apply_update("v2").await.is_err());
        assert_eq!(editor.updates(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_store_records_even_when_failing() {
        let store = RecordingMessageStore::new();
        store.set_should_fail(true);
        assert!(store
            .save_message("s", MessageRole::User, "hi")
            .await
            .is_err());
        store.wait_for(1).await;
        assert_eq!(store.saved()[0].content, "hi");
    }
}
