//! Line input for the chat loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustyline::error::ReadlineError;
use rustyline::{
    Cmd, ConditionalEventHandler, DefaultEditor, Event, EventContext, EventHandler, KeyEvent,
    RepeatCount,
};

use crate::error::Result;

/// What a read from the terminal produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A submitted line.
    Line(String),
    /// Ctrl-C was pressed.
    Interrupted {
        /// Whether the line being edited was empty at the time.
        line_was_empty: bool,
    },
    /// End of input (Ctrl-D or a closed stdin).
    Eof,
}

/// A source of user input lines.
pub trait LineReader {
    /// Shows `prompt` and reads one line.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    /// Records a submitted line in the history.
    fn add_history(&mut self, _line: &str) {}
}

/// Remembers whether the line was empty when Ctrl-C was pressed.
struct InterruptTracker {
    line_was_empty: Arc<AtomicBool>,
}

impl ConditionalEventHandler for InterruptTracker {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext,
    ) -> Option<Cmd> {
        self.line_was_empty
            .store(ctx.line().is_empty(), Ordering::Relaxed);
        Some(Cmd::Interrupt)
    }
}

/// A [`LineReader`] backed by a rustyline editor with in-memory history.
///
/// Ctrl-Z is ignored rather than suspending the process.
pub struct RustylineReader {
    editor: DefaultEditor,
    line_was_empty: Arc<AtomicBool>,
}

impl RustylineReader {
    /// Creates a reader attached to the terminal.
    pub fn new() -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        let line_was_empty = Arc::new(AtomicBool::new(true));
        editor.bind_sequence(
            KeyEvent::ctrl('C'),
            EventHandler::Conditional(Box::new(InterruptTracker {
                line_was_empty: Arc::clone(&line_was_empty),
            })),
        );
        editor.bind_sequence(KeyEvent::ctrl('Z'), EventHandler::Simple(Cmd::Noop));
        Ok(Self {
            editor,
            line_was_empty,
        })
    }
}

impl LineReader for RustylineReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        self.line_was_empty.store(true, Ordering::Relaxed);
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted {
                line_was_empty: self.line_was_empty.load(Ordering::Relaxed),
            }),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(err.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }
}
