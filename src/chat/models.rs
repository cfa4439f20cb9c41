//! The core models for a streamed single-turn conversation.
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

/// An ordered, append-only sequence of messages. The only mutation besides
/// `push` is updating the last entry while a stream for it is in flight,
/// and that update replaces the slot with a rebuilt message rather than
/// aliasing into it.
#[derive(Default)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    /// Append a token to the last message's content.
    pub fn append_to_last(&mut self, token: &str) {
        if let Some(last) = self.0.pop() {
            let mut content = last.content;
            content.push_str(token);
            self.0.push(Message {
                role: last.role,
                content,
            });
        }
    }

    /// Replace the last message's content entirely. Used for the error
    /// notice when a turn fails before producing any text.
    pub fn replace_last_content(&mut self, content: &str) {
        if let Some(last) = self.0.pop() {
            self.0.push(Message {
                role: last.role,
                content: content.to_string(),
            });
        }
    }
}
