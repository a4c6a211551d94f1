//! The interactive read-send-render loop.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::chat::input::{LineReader, ReadOutcome};
use crate::chat::session::ChatSession;
use crate::client::Transport;
use crate::error::Result;
use crate::render::{self, Renderer};

/// Printed once before the first prompt.
pub const BANNER: &str = "Type your prompt, then ENTER to submit. CTRL-C to quit.";

/// Printed when the loop ends.
pub const GOODBYE: &str = "Closing chat";

const EXIT_HINT: &str = "(press Ctrl-C again to quit)";

/// Why the loop stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The user typed `exit` or a quit command.
    Command,
    /// Input ended.
    EndOfInput,
    /// Ctrl-C twice in a row on an empty line.
    Interrupted,
}

/// Runs the chat loop until the user leaves.
///
/// `interrupted` is set by the process's Ctrl-C handler and stops a response
/// that is streaming. It is cleared before each prompt.
///
/// # Errors
///
/// Returns the first request or stream error, and input errors other than
/// interrupts and end of input. The caller should treat these as fatal.
pub async fn run<T: Transport>(
    session: &mut ChatSession<T>,
    reader: &mut dyn LineReader,
    renderer: &mut dyn Renderer,
    interrupted: &AtomicBool,
) -> Result<ExitReason> {
    let prompt = render::prompt(session.config().use_color);
    let mut exit_armed = false;

    loop {
        interrupted.store(false, Ordering::Relaxed);
        let line = match reader.read_line(&prompt)? {
            ReadOutcome::Line(line) => {
                exit_armed = false;
                line
            }
            ReadOutcome::Interrupted {
                line_was_empty: true,
            } => {
                if exit_armed {
                    debug!("second interrupt on an empty line");
                    return Ok(ExitReason::Interrupted);
                }
                exit_armed = true;
                renderer.print_info(EXIT_HINT);
                continue;
            }
            ReadOutcome::Interrupted {
                line_was_empty: false,
            } => {
                exit_armed = false;
                continue;
            }
            ReadOutcome::Eof => return Ok(ExitReason::EndOfInput),
        };

        if line.trim().is_empty() {
            continue;
        }
        reader.add_history(&line);

        if let Some(command) = parse_command(&line) {
            match command {
                ChatCommand::Quit => return Ok(ExitReason::Command),
                ChatCommand::Help => {
                    for line in help_text().lines() {
                        renderer.print_info(line);
                    }
                }
                ChatCommand::Stats => print_stats(session, renderer),
                ChatCommand::Invalid(message) => renderer.print_error(&message),
            }
            continue;
        }

        session
            .send_streaming(&line, renderer, interrupted)
            .await?;
    }
}

fn print_stats<T: Transport>(session: &ChatSession<T>, renderer: &mut dyn Renderer) {
    let stats = session.stats();
    renderer.print_info(&format!("Model: {}", stats.model));
    renderer.print_info(&format!("Turns: {}", stats.turn_count));
    renderer.print_info(&format!(
        "Reasoning model: {}",
        if stats.reasoning_model { "yes" } else { "no" }
    ));
    renderer.print_info(&format!(
        "System prompt: {}",
        stats.system_prompt.as_deref().unwrap_or("(none)")
    ));
    renderer.print_info(&format!(
        "Empty responses: {}, interrupted: {}",
        stats.empty_responses, stats.interrupted_responses
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatConfig;
    use crate::client::ChunkStream;
    use crate::render::PlainTextRenderer;
    use crate::types::{ChatCompletion, ChatCompletionChunk, ChatCompletionParams};
    use async_trait::async_trait;
    use std::collections::VecDeque;

    struct Script(VecDeque<ReadOutcome>);

    impl LineReader for Script {
        fn read_line(&mut self, _prompt: &str) -> Result<ReadOutcome> {
            Ok(self.0.pop_front().unwrap_or(ReadOutcome::Eof))
        }
    }

    struct Echo;

    #[async_trait]
    impl Transport for Echo {
        async fn complete(&self, _: ChatCompletionParams) -> Result<ChatCompletion> {
            Ok(ChatCompletion::default())
        }

        async fn stream(&self, params: ChatCompletionParams) -> Result<ChunkStream> {
            let last = params.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(Box::pin(futures::stream::iter(vec![Ok(
                ChatCompletionChunk::content(last),
            )])))
        }
    }

    async fn drive(script: Vec<ReadOutcome>) -> (ExitReason, usize, String) {
        let mut session = ChatSession::new(Echo, ChatConfig::new("m").without_color());
        let mut reader = Script(script.into());
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let interrupted = AtomicBool::new(false);
        let reason = run(&mut session, &mut reader, &mut renderer, &interrupted)
            .await
            .unwrap();
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        (reason, session.conversation().len(), output)
    }

    fn line(text: &str) -> ReadOutcome {
        ReadOutcome::Line(text.to_string())
    }

    const EMPTY_INTERRUPT: ReadOutcome = ReadOutcome::Interrupted {
        line_was_empty: true,
    };
    const LINE_INTERRUPT: ReadOutcome = ReadOutcome::Interrupted {
        line_was_empty: false,
    };

    #[tokio::test]
    async fn exit_word_ends_loop() {
        let (reason, turns, output) = drive(vec![line("ping"), line("exit"), line("late")]).await;
        assert_eq!(reason, ExitReason::Command);
        assert_eq!(turns, 2);
        assert_eq!(output, "ping\n\n");
    }

    #[tokio::test]
    async fn end_of_input_ends_loop() {
        let (reason, turns, _) = drive(vec![line("  "), line("")]).await;
        assert_eq!(reason, ExitReason::EndOfInput);
        assert_eq!(turns, 0);
    }

    #[tokio::test]
    async fn two_empty_line_interrupts_end_loop() {
        let (reason, _, output) = drive(vec![EMPTY_INTERRUPT, EMPTY_INTERRUPT, line("x")]).await;
        assert_eq!(reason, ExitReason::Interrupted);
        assert_eq!(output, format!("{EXIT_HINT}\n"));
    }

    #[tokio::test]
    async fn interrupt_on_typed_line_only_cancels_the_line() {
        let (reason, turns, _) = drive(vec![
            EMPTY_INTERRUPT,
            LINE_INTERRUPT,
            EMPTY_INTERRUPT,
            line("hello"),
            EMPTY_INTERRUPT,
        ])
        .await;
        assert_eq!(reason, ExitReason::EndOfInput);
        assert_eq!(turns, 2);
    }

    #[tokio::test]
    async fn commands_are_not_sent() {
        let (reason, turns, output) =
            drive(vec![line("/help"), line("/stats"), line("/bogus"), line("/q")]).await;
        assert_eq!(reason, ExitReason::Command);
        assert_eq!(turns, 0);
        assert!(output.contains("Available commands:"));
        assert!(output.contains("Model: m\nTurns: 0\n"));
        assert!(output.contains("Error: Unknown command: /bogus\n"));
    }
}
