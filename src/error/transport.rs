//! Transport-level error types.
//!
//! These errors cover opening the streaming request and reading its body.
//! Every variant is fatal for the turn that observed it.

use thiserror::Error;

/// Errors raised while opening or reading the response stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not connect to the generation service.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request or a body read timed out.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The service answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Reading the response body failed mid-stream.
    #[error("IO error: {0}")]
    Io(String),

    /// The configured endpoint is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The body ended before a completion marker was received.
    #[error("Stream closed before completion")]
    StreamClosed,

    /// Anything else reported by the HTTP stack.
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Short error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::ConnectionFailed(_) => "E_TRANSPORT_CONN",
            TransportError::Timeout(_) => "E_TRANSPORT_TIMEOUT",
            TransportError::ServerError { .. } => "E_TRANSPORT_STATUS",
            TransportError::Io(_) => "E_TRANSPORT_IO",
            TransportError::InvalidUrl(_) => "E_TRANSPORT_URL",
            TransportError::StreamClosed => "E_TRANSPORT_CLOSED",
            TransportError::Other(_) => "E_TRANSPORT_OTHER",
        }
    }

    /// User-facing text shown in the conversation when a turn fails.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::ConnectionFailed(_) => {
                "Could not reach the assistant service. Please try again.".to_string()
            }
            TransportError::Timeout(_) => {
                "The assistant service did not respond in time. Please try again.".to_string()
            }
            TransportError::ServerError { status, .. } => {
                format!("The assistant service returned an error ({}).", status)
            }
            TransportError::StreamClosed => {
                "The response ended unexpectedly. Please resubmit your message.".to_string()
            }
            TransportError::Io(_) | TransportError::InvalidUrl(_) | TransportError::Other(_) => {
                format!("Connection problem: {}", self)
            }
        }
    }
}
