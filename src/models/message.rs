use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    /// Progress note ("thinking") shown while the answer streams
    Status,
    /// Progress note about tool activity
    Tool,
    Error,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Status => "status",
            MessageRole::Tool => "tool",
            MessageRole::Error => "error",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which wire field a status message came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// `thinking_message`
    Thinking,
    /// `tool_message`, and the client's own tool round-trip notes
    Tool,
}

impl StatusKind {
    /// Role used for a status message of this kind
    pub fn role(&self) -> MessageRole {
        match self {
            StatusKind::Thinking => MessageRole::Status,
            StatusKind::Tool => MessageRole::Tool,
        }
    }
}

/// File or link attached to a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    /// MIME type or coarse kind, serialized as `type`
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            url: url.into(),
        }
    }
}

/// One entry of the conversation log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Closed messages never change again. Only an assistant message can be open.
    pub terminal: bool,
    /// Set for status/tool messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_kind: Option<StatusKind>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn closed(role: MessageRole, content: String) -> Self {
        Self {
            role,
            content,
            attachments: Vec::new(),
            terminal: true,
            status_kind: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            attachments,
            ..Self::closed(MessageRole::User, content.into())
        }
    }

    /// An open assistant message that deltas can coalesce into
    pub fn open_assistant(content: impl Into<String>) -> Self {
        Self {
            terminal: false,
            ..Self::closed(MessageRole::Assistant, content.into())
        }
    }

    pub fn status(kind: StatusKind, content: impl Into<String>) -> Self {
        Self {
            status_kind: Some(kind),
            ..Self::closed(kind.role(), content.into())
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::closed(MessageRole::Error, content.into())
    }

    /// True for an assistant message still accepting deltas
    pub fn is_open_assistant(&self) -> bool {
        self.role == MessageRole::Assistant && !self.terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_wire_format() {
        let json = r#"{"name":"report.pdf","type":"application/pdf","url":"https://files/1"}"#;
        let attachment: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(
            attachment,
            Attachment::new("report.pdf", "application/pdf", "https://files/1")
        );
        let back = serde_json::to_value(&attachment).unwrap();
        assert_eq!(back["type"], "application/pdf");
    }

    #[test]
    fn test_attachment_missing_optional_fields() {
        let attachment: Attachment = serde_json::from_str(r#"{"name":"a.txt"}"#).unwrap();
        assert_eq!(attachment.kind, "");
        assert_eq!(attachment.url, "");
    }

    #[test]
    fn test_only_assistant_messages_open() {
        assert!(Message::open_assistant("").is_open_assistant());
        assert!(!Message::user("hi", vec![]).is_open_assistant());
        assert!(!Message::status(StatusKind::Thinking, "...").is_open_assistant());
        assert!(!Message::error("boom").is_open_assistant());
    }

    #[test]
    fn test_status_role_follows_kind() {
        assert_eq!(
            Message::status(StatusKind::Thinking, "x").role,
            MessageRole::Status
        );
        assert_eq!(Message::status(StatusKind::Tool, "x").role, MessageRole::Tool);
        assert_eq!(
            Message::status(StatusKind::Tool, "x").status_kind,
            Some(StatusKind::Tool)
        );
    }

    #[test]
    fn test_role_display() {
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
        assert_eq!(
            serde_json::to_string(&MessageRole::Error).unwrap(),
            "\"error\""
        );
    }
}
