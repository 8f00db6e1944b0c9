//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockTransport`] - streaming transport with scripted responses
//! - [`MockDocumentSurface`] - document content, optionally held open
//! - [`RecordingEditor`] - records document updates
//! - [`RecordingMessageStore`] - records persisted messages
//! - [`RecordingUploader`] - records attachment uploads

pub mod collaborators;
pub mod transport;

pub use collaborators::{
    MockDocumentSurface, RecordingEditor, RecordingMessageStore, RecordingUploader, SavedMessage,
};
pub use transport::{frame_chunk, MockStream, MockTransport, RecordedRequest};
