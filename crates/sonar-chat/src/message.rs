use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown to the user when a turn fails, whatever the cause.
pub const FAILED_RESPONSE_MESSAGE: &str = "Failed to get a response. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One conversation entry.
///
/// `id` is opaque: clients may send any string or none, in which case a UUID is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_id")]
    pub id: String,
    pub role: Role,
    pub content: String,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Append-only conversation log plus the in-flight flags.
///
/// A turn appends the user message up front. The assistant message is created by the
/// first streamed chunk and grows with each later one. A failure before any chunk
/// leaves only the user message; a failure mid-stream keeps the partial reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
    pending: bool,
    error: Option<String>,
    streaming: Option<usize>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The assistant message currently being streamed into, if any.
    pub fn streaming_reply(&self) -> Option<&Message> {
        self.streaming.and_then(|index| self.messages.get(index))
    }

    /// Append the user message and return the history to dispatch.
    pub fn begin_turn(&mut self, content: impl Into<String>) -> Vec<Message> {
        self.messages.push(Message::user(content));
        self.pending = true;
        self.error = None;
        self.streaming = None;
        self.messages.clone()
    }

    pub fn append_chunk(&mut self, chunk: &str) {
        match self.streaming.and_then(|index| self.messages.get_mut(index)) {
            Some(reply) => reply.content.push_str(chunk),
            None => {
                self.messages.push(Message::assistant(chunk));
                self.streaming = Some(self.messages.len() - 1);
            }
        }
    }

    /// Close the turn successfully. An empty stream still yields an (empty) reply.
    pub fn complete(&mut self) {
        if self.streaming.is_none() {
            self.messages.push(Message::assistant(String::new()));
        }
        self.settle();
    }

    /// Close the turn with an error. Already-appended text stays.
    pub fn fail(&mut self) {
        self.error = Some(String::from(FAILED_RESPONSE_MESSAGE));
        self.settle();
    }

    /// Stop the turn at the caller's request. Already-appended text stays.
    pub fn cancel(&mut self) {
        self.settle();
    }

    fn settle(&mut self) {
        self.pending = false;
        self.streaming = None;
    }
}
