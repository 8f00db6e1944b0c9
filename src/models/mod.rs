//! Data model: messages, the conversation log, turn status, and the request
//! bodies posted to the generation service.

mod conversation;
mod message;
mod request;
mod turn;

pub use conversation::{Conversation, ModelChange};
pub use message::{Attachment, Message, MessageRole, StatusKind};
pub use request::{ContinuationRequest, OutboundRequest, StreamRequest, ToolResult};
pub use turn::TurnStatus;
