use serde::{Deserialize, Serialize};

use crate::types::{MessageRole, ToolCall};

/// One role-attributed turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the turn.
    pub role: MessageRole,

    /// The text of the turn.
    pub content: String,

    /// Function calls the assistant requested in this turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatMessage {
    /// Create a new `ChatMessage` with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create a new system `ChatMessage`.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a new user `ChatMessage`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant `ChatMessage`.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Attaches tool calls to this message.
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn user_message_serialization() {
        let message = ChatMessage::user("Hello");
        assert_eq!(
            to_value(&message).unwrap(),
            json!({"role": "user", "content": "Hello"})
        );
    }

    #[test]
    fn assistant_message_with_tool_calls() {
        let message = ChatMessage::assistant("")
            .with_tool_calls(vec![ToolCall::new(0, "call_9", "search", "{}")]);
        assert_eq!(
            to_value(&message).unwrap(),
            json!({
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": {"name": "search", "arguments": "{}"}
                }]
            })
        );
    }
}
