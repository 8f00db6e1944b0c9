use serde::{Deserialize, Serialize};

/// Initial request that opens a turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamRequest {
    /// Session the turn belongs to
    pub session_id: String,
    /// The user's prompt
    pub message: String,
    /// Current editor content, sent up front when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_content: Option<String>,
}

impl StreamRequest {
    /// Create a new StreamRequest without document context
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            document_content: None,
        }
    }

    /// Attach document content (builder pattern)
    pub fn with_document_content(mut self, content: Option<String>) -> Self {
        self.document_content = content;
        self
    }
}

/// Result of a tool call, as sent back to the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub result: String,
}

/// Request that resumes a turn after a tool round trip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContinuationRequest {
    pub session_id: String,
    /// Always empty for continuations
    pub message: String,
    /// Always true for continuations
    pub is_tool_response: bool,
    pub tool_result: ToolResult,
    /// Opaque context echoed back from the tool-call frame
    pub agent_context: serde_json::Value,
}

impl ContinuationRequest {
    pub fn new(
        session_id: impl Into<String>,
        tool_call_id: impl Into<String>,
        result: impl Into<String>,
        agent_context: serde_json::Value,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            message: String::new(),
            is_tool_response: true,
            tool_result: ToolResult {
                tool_call_id: tool_call_id.into(),
                result: result.into(),
            },
            agent_context,
        }
    }
}

/// Any request body the turn controller posts to the stream endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OutboundRequest {
    Start(StreamRequest),
    Continuation(ContinuationRequest),
}

impl OutboundRequest {
    pub fn is_continuation(&self) -> bool {
        matches!(self, OutboundRequest::Continuation(_))
    }
}
