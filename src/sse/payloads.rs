//! Wire payload deserialization structs.
//!
//! Every frame is a flat JSON object; all fields are optional and unknown
//! fields are ignored.

use serde::Deserialize;

use crate::models::Attachment;

/// One decoded `data:` frame.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WirePayload {
    /// Assistant text delta
    pub content: Option<String>,
    pub thinking_message: Option<String>,
    pub tool_message: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    /// Tool call: the service needs the current document to continue
    pub needs_document_content: Option<ToolCallField>,
    /// Replacement content for the editor surface
    pub document_update: Option<String>,
    pub done: Option<bool>,
    /// Backend-reported failure
    pub error: Option<String>,
    /// Top-level tool call id, used with the boolean form of `needs_document_content`
    pub tool_call_id: Option<String>,
    /// Top-level agent context, used with the boolean form of `needs_document_content`
    pub agent_context: Option<serde_json::Value>,
}

/// `needs_document_content` is normally an object, but a bare `true` with the
/// identifiers at the top level is accepted too.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolCallField {
    Details(ToolCallDetails),
    Flag(bool),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ToolCallDetails {
    #[serde(default)]
    pub tool_call_id: String,
    #[serde(default)]
    pub agent_context: serde_json::Value,
}

impl WirePayload {
    /// Resolve the tool call carried by this payload, if any.
    pub fn tool_call(&self) -> Option<ToolCallDetails> {
        match self.needs_document_content.as_ref()? {
            ToolCallField::Details(details) => {
                let mut details = details.clone();
                if details.tool_call_id.is_empty() {
                    details.tool_call_id = self.tool_call_id.clone().unwrap_or_default();
                }
                if details.agent_context.is_null() {
                    details.agent_context = self.agent_context.clone().unwrap_or_default();
                }
                Some(details)
            }
            ToolCallField::Flag(true) => Some(ToolCallDetails {
                tool_call_id: self.tool_call_id.clone().unwrap_or_default(),
                agent_context: self.agent_context.clone().unwrap_or_default(),
            }),
            ToolCallField::Flag(false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_fields_optional() {
        let payload: WirePayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload, WirePayload::default());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let payload: WirePayload =
            serde_json::from_str(r#"{"content":"x","seq":4,"extra":{"a":1}}"#).unwrap();
        assert_eq!(payload.content.as_deref(), Some("x"));
    }

    #[test]
    fn test_tool_call_object_form() {
        let payload: WirePayload = serde_json::from_str(
            r#"{"needs_document_content":{"tool_call_id":"c1","agent_context":{"k":"v"}}}"#,
        )
        .unwrap();
        let call = payload.tool_call().unwrap();
        assert_eq!(call.tool_call_id, "c1");
        assert_eq!(call.agent_context, json!({"k": "v"}));
    }

    #[test]
    fn test_tool_call_flag_form() {
        let payload: WirePayload = serde_json::from_str(
            r#"{"needs_document_content":true,"tool_call_id":"c2","agent_context":[1]}"#,
        )
        .unwrap();
        let call = payload.tool_call().unwrap();
        assert_eq!(call.tool_call_id, "c2");
        assert_eq!(call.agent_context, json!([1]));
    }

    #[test]
    fn test_tool_call_false_flag_is_absent() {
        let payload: WirePayload =
            serde_json::from_str(r#"{"needs_document_content":false}"#).unwrap();
        assert!(payload.tool_call().is_none());
    }

    #[test]
    fn test_wrong_field_type_fails() {
        assert!(serde_json::from_str::<WirePayload>(r#"{"content":5}"#).is_err());
        assert!(serde_json::from_str::<WirePayload>("[1,2]").is_err());
    }
}
