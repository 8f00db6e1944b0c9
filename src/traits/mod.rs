//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`StreamTransport`] - streamed POST to the generation service
//! - [`DocumentSurface`] - current editor content for tool calls
//! - [`EditorSurface`] - target of `document_update` frames
//! - [`MessageStore`] - message persistence
//! - [`AttachmentUploader`] - attachment upload

pub mod collaborators;
pub mod transport;

pub use collaborators::{AttachmentUploader, DocumentSurface, EditorSurface, MessageStore};
pub use transport::{ByteStream, Headers, StreamTransport};
