//! Collaborators for running without a persistence backend.
//!
//! The command-line client has no database or blob store, so finished
//! messages go to the log and attachment uploads are skipped.

use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::models::{Attachment, MessageRole};
use crate::traits::{AttachmentUploader, MessageStore};

/// Message store that writes each saved message to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessageStore;

#[async_trait]
impl MessageStore for LogMessageStore {
    async fn save_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), CollaboratorError> {
        tracing::info!(
            session_id,
            role = role.as_str(),
            "Saved message ({} chars)",
            content.chars().count()
        );
        Ok(())
    }
}

/// Uploader that accepts every attachment without sending it anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUploader;

#[async_trait]
impl AttachmentUploader for NoopUploader {
    async fn upload(
        &self,
        session_id: &str,
        attachment: &Attachment,
    ) -> Result<(), CollaboratorError> {
        tracing::debug!(session_id, "Skipping upload of {}", attachment.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_store_accepts_messages() {
        let store = LogMessageStore;
        assert!(store
            .save_message("s1", MessageRole::Assistant, "done")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_noop_uploader_accepts_attachments() {
        let uploader = NoopUploader;
        let attachment = Attachment::new("a.png", "image/png", "");
        assert!(uploader.upload("s1", &attachment).await.is_ok());
    }
}
