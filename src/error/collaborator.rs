//! Errors reported by external collaborators (document surface, persistence,
//! attachment upload).

use thiserror::Error;

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// No editor surface is attached, so there is no document to read or update.
    #[error("No document surface is attached")]
    NoSurface,

    /// The collaborator exists but could not serve the request.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// Filesystem failure in a file-backed collaborator.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        CollaboratorError::Io(err.to_string())
    }
}
