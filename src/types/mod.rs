// Public modules
pub mod chat_completion;
pub mod chat_completion_chunk;
pub mod chat_completion_params;
pub mod chat_message;
pub mod message_role;
pub mod tool_call;

// Re-exports
pub use chat_completion::{ChatCompletion, CompletionChoice, CompletionMessage};
pub use chat_completion_chunk::{
    ChatCompletionChunk, ChunkChoice, ChunkDelta, FunctionDelta, ToolCallDelta,
};
pub use chat_completion_params::ChatCompletionParams;
pub use chat_message::ChatMessage;
pub use message_role::{MessageRole, MessageRoleParseError};
pub use tool_call::{ToolCall, ToolCallFunction};
