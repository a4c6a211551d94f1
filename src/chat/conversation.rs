//! Conversation history.

use crate::observability::TURNS_APPENDED;
use crate::types::{ChatMessage, MessageRole};

/// An append-only, chronologically ordered list of turns.
///
/// Turns are never reordered or removed once appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<ChatMessage>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a completed exchange: the user prompt and the assistant reply.
    pub fn append_exchange(&mut self, user: ChatMessage, assistant: ChatMessage) {
        debug_assert_eq!(user.role, MessageRole::User);
        debug_assert_eq!(assistant.role, MessageRole::Assistant);
        self.turns.push(user);
        self.turns.push(assistant);
        TURNS_APPENDED.count(2);
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Builds the message list for a request: the optional system prompt,
    /// then every turn, then `next`.
    pub fn request_messages(&self, system: Option<&str>, next: &ChatMessage) -> Vec<ChatMessage> {
        system
            .map(ChatMessage::system)
            .into_iter()
            .chain(self.turns.iter().cloned())
            .chain(std::iter::once(next.clone()))
            .collect()
    }
}
