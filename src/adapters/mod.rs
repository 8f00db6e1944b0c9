//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestTransport`] - streaming HTTP transport using reqwest
//! - [`FileDocumentSurface`] - document surface backed by a file
//! - [`LogMessageStore`] - message store that writes to the log
//! - [`NoopUploader`] - attachment uploader that skips uploads
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for the transport and every
//! collaborator.

pub mod file_document;
pub mod log_store;
pub mod mock;
pub mod reqwest_transport;

pub use file_document::FileDocumentSurface;
pub use log_store::{LogMessageStore, NoopUploader};
pub use reqwest_transport::ReqwestTransport;
