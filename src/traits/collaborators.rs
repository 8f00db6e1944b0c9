//! Narrow interfaces to the components that live outside the turn core.
//!
//! - [`DocumentSurface`] - reads the current editor content for tool calls
//! - [`EditorSurface`] - receives `document_update` frames
//! - [`MessageStore`] - persists finished messages (fire-and-forget)
//! - [`AttachmentUploader`] - uploads user attachments, independent of the stream

use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::models::{Attachment, MessageRole};

/// Source of the current document for tool round trips.
#[async_trait]
pub trait DocumentSurface: Send + Sync {
    /// Current document content.
    ///
    /// Fails with [`CollaboratorError::NoSurface`] when no editor is attached.
    async fn current_content(&self) -> Result<String, CollaboratorError>;
}

/// Sink for document updates pushed by the service.
#[async_trait]
pub trait EditorSurface: Send + Sync {
    async fn apply_update(&self, content: &str) -> Result<(), CollaboratorError>;
}

/// Persistence of conversation messages.
///
/// Called on a spawned task; errors are logged and never reach the turn.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn save_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), CollaboratorError>;
}

/// Upload of attachments the user sent with a prompt.
#[async_trait]
pub trait AttachmentUploader: Send + Sync {
    async fn upload(&self, session_id: &str, attachment: &Attachment)
        -> Result<(), CollaboratorError>;
}
