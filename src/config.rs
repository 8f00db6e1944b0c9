//! Client configuration.
//!
//! Use the builder methods to customize, or [`ClientConfig::from_env`] to
//! pick up `PARLOR_*` environment variables.
//!
//! ```ignore
//! use parlor::config::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_base_url("https://assist.example.com")
//!     .with_auth_token("secret");
//! ```

use crate::sse::{FrameParser, DEFAULT_FRAME_PREFIX, DEFAULT_TERMINAL_TOKEN};
use crate::traits::Headers;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_STREAM_PATH: &str = "/api/chat/stream";

/// Settings for talking to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Service root, without trailing slash
    pub base_url: String,
    /// Path of the streaming endpoint
    pub stream_path: String,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
    /// Marker that starts a frame line
    pub frame_prefix: String,
    /// Payload that ends the stream
    pub terminal_token: String,
    /// Send the current document with the first request of a turn
    pub include_document_on_start: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            auth_token: None,
            frame_prefix: DEFAULT_FRAME_PREFIX.to_string(),
            terminal_token: DEFAULT_TERMINAL_TOKEN.to_string(),
            include_document_on_start: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_frame_markers(
        mut self,
        prefix: impl Into<String>,
        terminal_token: impl Into<String>,
    ) -> Self {
        self.frame_prefix = prefix.into();
        self.terminal_token = terminal_token.into();
        self
    }

    pub fn with_include_document_on_start(mut self, include: bool) -> Self {
        self.include_document_on_start = include;
        self
    }

    /// Build from `PARLOR_BASE_URL`, `PARLOR_STREAM_PATH`, `PARLOR_AUTH_TOKEN`
    /// and `PARLOR_INCLUDE_DOCUMENT` (`1`/`true`). Unset variables keep defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("PARLOR_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(path) = lookup("PARLOR_STREAM_PATH") {
            config = config.with_stream_path(path);
        }
        if let Some(token) = lookup("PARLOR_AUTH_TOKEN").filter(|t| !t.is_empty()) {
            config = config.with_auth_token(token);
        }
        if let Some(flag) = lookup("PARLOR_INCLUDE_DOCUMENT") {
            config = config.with_include_document_on_start(matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ));
        }
        config
    }

    /// Full URL of the streaming endpoint.
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, self.stream_path)
    }

    /// Headers sent with every stream request.
    pub fn request_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        if let Some(token) = &self.auth_token {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }

    /// A fresh parser using the configured markers.
    pub fn frame_parser(&self) -> FrameParser {
        FrameParser::with_markers(self.frame_prefix.clone(), self.terminal_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.stream_url(), "http://localhost:8000/api/chat/stream");
        assert_eq!(config.terminal_token, "[DONE]");
        assert!(!config.include_document_on_start);
        assert!(!config.request_headers().contains_key("Authorization"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ClientConfig::new().with_base_url("https://x.test/");
        assert_eq!(config.stream_url(), "https://x.test/api/chat/stream");
    }

    #[test]
    fn test_auth_header() {
        let headers = ClientConfig::new().with_auth_token("abc").request_headers();
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer abc");
        assert_eq!(headers.get("Accept").unwrap(), "text/event-stream");
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("PARLOR_BASE_URL", "http://10.0.0.2:9000"),
            ("PARLOR_STREAM_PATH", "/v2/stream"),
            ("PARLOR_AUTH_TOKEN", "tok"),
            ("PARLOR_INCLUDE_DOCUMENT", "TRUE"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.stream_url(), "http://10.0.0.2:9000/v2/stream");
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert!(config.include_document_on_start);
    }

    #[test]
    fn test_from_lookup_empty_token_ignored() {
        let config = ClientConfig::from_lookup(|key| {
            (key == "PARLOR_AUTH_TOKEN").then(String::new)
        });
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_frame_parser_uses_markers() {
        let mut parser = ClientConfig::new()
            .with_frame_markers("event-data:", "END")
            .frame_parser();
        assert_eq!(parser.push(b"event-data: END\n"), vec![crate::sse::Frame::Terminal]);
    }
}
