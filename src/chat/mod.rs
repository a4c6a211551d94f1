//! Interactive chat against an OpenAI-compatible server.
//!
//! This module provides a streaming REPL built on top of the client library.
//! It supports:
//!
//! - Streaming responses with real-time token display
//! - Reasoning text shown apart from the answer
//! - Slash commands for session control
//! - Configuration from the command line and the environment
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`conversation`]: the append-only turn history
//! - [`session`]: sending prompts and rendering streamed replies
//! - [`commands`]: slash command parsing
//! - [`input`]: the line editor seam
//! - [`repl`]: the loop tying them together

pub mod commands;
pub mod config;
pub mod conversation;
pub mod input;
pub mod repl;
pub mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, is_truthy};
pub use conversation::Conversation;
pub use input::{LineReader, ReadOutcome, RustylineReader};
pub use repl::{BANNER, ExitReason, GOODBYE};
pub use session::{ChatSession, SessionStats};
