//! Command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`, plus
//! the bare `exit` word, allowing users to control the chat session without
//! sending messages to the server.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics (model, turn count, reasoning mode).
    Stats,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a regular message.
///
/// # Examples
///
/// ```
/// # use thinkline::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("exit"), Some(ChatCommand::Quit));
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("exit strategies for startups").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    if input == "exit" {
        return Some(ChatCommand::Quit);
    }

    let rest = input.strip_prefix('/')?;
    let command = rest.split_whitespace().next().unwrap_or("").to_lowercase();

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "" => ChatCommand::Invalid("Empty command; type /help for commands".to_string()),
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };
    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /help                  Show this help
  /stats                 Show model, turn count and reasoning mode
  /quit, /exit, /q       Exit the chat (so does typing exit)

Keys:
  Ctrl-C                 Clear the line; twice on an empty line to quit
  Ctrl-C while streaming Stop the response without saving it
  Ctrl-D                 Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_word_and_aliases_quit() {
        for input in ["exit", "  exit  ", "/exit", "/quit", "/q", "/QUIT"] {
            assert_eq!(parse_command(input), Some(ChatCommand::Quit), "{input:?}");
        }
    }

    #[test]
    fn regular_text_is_not_a_command() {
        assert_eq!(parse_command("Hello there"), None);
        assert_eq!(parse_command("exit now"), None);
        assert_eq!(parse_command("Exit"), None);
        assert_eq!(parse_command("what does a/b mean?"), None);
    }

    #[test]
    fn help_and_stats() {
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/status extra"), Some(ChatCommand::Stats));
    }

    #[test]
    fn unknown_commands_are_invalid() {
        assert_eq!(
            parse_command("/model gpt-4o"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
        assert!(matches!(parse_command("/"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn help_mentions_every_command() {
        let help = help_text();
        for command in ["/help", "/stats", "/quit", "/exit", "/q"] {
            assert!(help.contains(command), "{command}");
        }
    }
}
