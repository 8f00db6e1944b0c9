//! Append-only conversation log with delta coalescing.
//!
//! The log only ever grows, with one exception: the open assistant message
//! of the current turn may have text appended to it (coalescing) and
//! attachments merged into it.

use serde::Serialize;

use super::message::{Attachment, Message, MessageRole, StatusKind};

/// What a mutation did to the log, for incremental rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "index", rename_all = "snake_case")]
pub enum ModelChange {
    /// A new message was pushed at this index
    Appended(usize),
    /// The message at this index was modified in place
    Updated(usize),
}

impl ModelChange {
    pub fn index(&self) -> usize {
        match self {
            ModelChange::Appended(i) | ModelChange::Updated(i) => *i,
        }
    }
}

/// Ordered message log for one session.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    /// Assistant message pinned across a tool round trip
    anchor: Option<usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn push(&mut self, message: Message) -> ModelChange {
        self.messages.push(message);
        ModelChange::Appended(self.messages.len() - 1)
    }

    pub fn append_user_message(
        &mut self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> ModelChange {
        self.push(Message::user(text, attachments))
    }

    /// Open a new, empty assistant message for the coming deltas.
    pub fn append_streaming_placeholder(&mut self) -> ModelChange {
        self.push(Message::open_assistant(""))
    }

    /// Append a status message. An untouched placeholder at the tail is
    /// replaced by it, so the next delta opens a fresh assistant message
    /// after the status.
    pub fn append_status(&mut self, kind: StatusKind, text: impl Into<String>) -> ModelChange {
        let status = Message::status(kind, text);
        match self.untouched_placeholder() {
            Some(index) => {
                self.messages[index] = status;
                ModelChange::Updated(index)
            }
            None => self.push(status),
        }
    }

    /// Index of the tail message if it is an empty, unanchored placeholder.
    fn untouched_placeholder(&self) -> Option<usize> {
        let index = self.messages.len().checked_sub(1)?;
        let last = &self.messages[index];
        let untouched = last.is_open_assistant()
            && last.content.is_empty()
            && last.attachments.is_empty()
            && self.anchor != Some(index);
        untouched.then_some(index)
    }

    pub fn append_error(&mut self, text: impl Into<String>) -> ModelChange {
        self.push(Message::error(text))
    }

    /// Append a content delta.
    ///
    /// Goes to the anchored message while a resumed tool round trip is in
    /// effect, else to the last message if it is an open assistant message,
    /// else into a new assistant message.
    pub fn apply_content_delta(&mut self, text: &str) -> ModelChange {
        if let Some(index) = self.anchor {
            if let Some(message) = self.messages.get_mut(index) {
                if message.is_open_assistant() {
                    message.content.push_str(text);
                    return ModelChange::Updated(index);
                }
            }
        }

        if let Some(last) = self.messages.last_mut() {
            if last.is_open_assistant() {
                last.content.push_str(text);
                return ModelChange::Updated(self.messages.len() - 1);
            }
        }

        self.push(Message::open_assistant(text))
    }

    /// Index of the nearest assistant message at or after the last user message.
    fn nearest_assistant(&self) -> Option<usize> {
        for (index, message) in self.messages.iter().enumerate().rev() {
            match message.role {
                MessageRole::Assistant => return Some(index),
                MessageRole::User => return None,
                _ => {}
            }
        }
        None
    }

    /// Merge attachments into the nearest assistant message of the current
    /// exchange, or append an attachment-only assistant message if there is none.
    pub fn attach_to_last_assistant(&mut self, attachments: Vec<Attachment>) -> ModelChange {
        match self.nearest_assistant() {
            Some(index) => {
                self.messages[index].attachments.extend(attachments);
                ModelChange::Updated(index)
            }
            None => {
                let mut message = Message::open_assistant("");
                message.attachments = attachments;
                self.push(message)
            }
        }
    }

    /// Pin the open assistant message so deltas after a tool round trip keep
    /// coalescing into it. Opens a placeholder first when there is none.
    pub fn anchor_open_assistant(&mut self) -> Option<ModelChange> {
        match self.nearest_assistant() {
            Some(index) if self.messages[index].is_open_assistant() => {
                self.anchor = Some(index);
                None
            }
            _ => {
                let change = self.append_streaming_placeholder();
                self.anchor = Some(change.index());
                Some(change)
            }
        }
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn clear_anchor(&mut self) {
        self.anchor = None;
    }

    /// Close every open assistant message. Returns the indices that changed.
    pub fn finalize(&mut self) -> Vec<usize> {
        self.anchor = None;
        let mut closed = Vec::new();
        for (index, message) in self.messages.iter_mut().enumerate() {
            if message.is_open_assistant() {
                message.terminal = true;
                closed.push(index);
            }
        }
        closed
    }

    /// Text of the assistant messages after the last user message, joined.
    pub fn current_reply(&self) -> String {
        let start = self
            .messages
            .iter()
            .rposition(|m| m.role == MessageRole::User)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.messages[start..]
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.as_str())
            .collect()
    }
}
