//! Output rendering for streamed chat responses.
//!
//! This module provides the renderer trait and a plain-text implementation
//! that colors reasoning and visible text differently.

use std::io::{self, Stdout, Write};

use crate::types::ToolCall;

/// ANSI escape code for purple text (used for reasoning).
const ANSI_PURPLE: &str = "\x1b[0;35m";

/// ANSI escape code for blue text (used for the visible answer).
const ANSI_BLUE: &str = "\x1b[0;34m";

/// ANSI escape code for red text (used for the prompt and errors).
const ANSI_RED: &str = "\x1b[0;31m";

/// ANSI escape code for yellow text (used for finished tool calls and refusals).
const ANSI_YELLOW: &str = "\x1b[0;33m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Returns the input prompt, red when `use_color` is set.
pub fn prompt(use_color: bool) -> String {
    if use_color {
        format!("{ANSI_RED}» {ANSI_RESET}")
    } else {
        "» ".to_string()
    }
}

/// Trait for rendering streaming output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print a chunk of the visible answer.
    ///
    /// This is called incrementally as tokens are streamed from the server.
    fn print_visible(&mut self, text: &str);

    /// Print a chunk of reasoning text.
    fn print_reasoning(&mut self, text: &str);

    /// Print a tool call whose stream has finished.
    fn print_tool_call(&mut self, call: &ToolCall);

    /// Print a refusal whose stream has finished.
    fn print_refusal(&mut self, refusal: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message on its own line.
    fn print_info(&mut self, info: &str);

    /// Called when a response is complete.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self);
}

/// Plain text renderer with optional ANSI styling.
///
/// Output goes to stdout unless another writer is supplied.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    line_start: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            line_start: true,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        // Terminal write errors are not recoverable mid-response.
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
        self.line_start = text.ends_with('\n');
    }

    fn write_colored(&mut self, color: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.use_color {
            let _ = write!(self.out, "{color}{text}{ANSI_RESET}");
            let _ = self.out.flush();
            self.line_start = text.ends_with('\n');
        } else {
            self.write(text);
        }
    }

    fn write_line(&mut self, color: Option<&str>, line: &str) {
        if !self.line_start {
            self.write("\n");
        }
        match color {
            Some(color) => self.write_colored(color, line),
            None => self.write(line),
        }
        self.write("\n");
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_visible(&mut self, text: &str) {
        self.write_colored(ANSI_BLUE, text);
    }

    fn print_reasoning(&mut self, text: &str) {
        self.write_colored(ANSI_PURPLE, text);
    }

    fn print_tool_call(&mut self, call: &ToolCall) {
        let line = format!(
            "Tool call stream finished {}: {} {}",
            call.index, call.function.name, call.function.arguments
        );
        self.write_line(Some(ANSI_YELLOW), &line);
    }

    fn print_refusal(&mut self, refusal: &str) {
        self.write_line(
            Some(ANSI_YELLOW),
            &format!("Refusal stream finished: {refusal}"),
        );
    }

    fn print_error(&mut self, error: &str) {
        self.write_line(Some(ANSI_RED), &format!("Error: {error}"));
    }

    fn print_info(&mut self, info: &str) {
        self.write_line(None, info);
    }

    fn finish_response(&mut self) {
        self.write("\n\n");
    }

    fn print_interrupted(&mut self) {
        self.write_line(None, "[interrupted]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(use_color: bool, f: impl FnOnce(&mut PlainTextRenderer<Vec<u8>>)) -> String {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), use_color);
        f(&mut renderer);
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
        assert!(!PlainTextRenderer::with_color(false).use_color);
    }

    #[test]
    fn channels_use_distinct_colors() {
        let out = render(true, |r| {
            r.print_reasoning("hmm");
            r.print_visible("answer");
        });
        assert_eq!(out, "\x1b[0;35mhmm\x1b[0m\x1b[0;34manswer\x1b[0m");
    }

    #[test]
    fn plain_output_has_no_escapes() {
        let out = render(false, |r| {
            r.print_reasoning("<think>hmm</think>");
            r.print_visible("answer");
            r.finish_response();
        });
        assert_eq!(out, "<think>hmm</think>answer\n\n");
    }

    #[test]
    fn finished_fields_start_on_a_fresh_line() {
        let out = render(false, |r| {
            r.print_visible("Checking");
            r.print_tool_call(&ToolCall::new(0, "call_1", "weather", "{\"city\":\"Oslo\"}"));
            r.print_refusal("no");
        });
        assert_eq!(
            out,
            "Checking\nTool call stream finished 0: weather {\"city\":\"Oslo\"}\nRefusal stream finished: no\n"
        );
    }

    #[test]
    fn interrupted_marker() {
        let out = render(false, |r| {
            r.print_visible("partial");
            r.print_interrupted();
        });
        assert_eq!(out, "partial\n[interrupted]\n");
    }

    #[test]
    fn prompt_is_red_only_with_color() {
        assert_eq!(prompt(false), "» ");
        assert!(prompt(true).starts_with(ANSI_RED));
    }
}
