//! File-backed document surface.
//!
//! Lets the command-line client answer tool calls from a file on disk and
//! write `document_update` frames back to it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::CollaboratorError;
use crate::traits::{DocumentSurface, EditorSurface};

/// Document surface backed by a single file.
///
/// Without a path it behaves like a client with no editor open: reads and
/// updates fail with [`CollaboratorError::NoSurface`].
///
/// # Example
///
/// ```ignore
/// use parlor::adapters::FileDocumentSurface;
/// use parlor::traits::DocumentSurface;
///
/// let surface = FileDocumentSurface::new(Some("notes.md".into()));
/// let content = surface.current_content().await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileDocumentSurface {
    path: Option<PathBuf>,
}

impl FileDocumentSurface {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// A surface with no document.
    pub fn detached() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn require_path(&self) -> Result<&Path, CollaboratorError> {
        self.path.as_deref().ok_or(CollaboratorError::NoSurface)
    }
}

#[async_trait]
impl DocumentSurface for FileDocumentSurface {
    async fn current_content(&self) -> Result<String, CollaboratorError> {
        let path = self.require_path()?;
        let content = tokio::fs::read_to_string(path).await?;
        tracing::debug!("Read {} bytes from {}", content.len(), path.display());
        Ok(content)
    }
}

#[async_trait]
impl EditorSurface for FileDocumentSurface {
    async fn apply_update(&self, content: &str) -> Result<(), CollaboratorError> {
        let path = self.require_path()?;
        tokio::fs::write(path, content).await?;
        tracing::info!("Applied document update to {}", path.display());
        Ok(())
    }
}
