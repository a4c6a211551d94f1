//! Accumulates streamed chat completion chunks into a complete message.
//!
//! The accumulator merges content, refusal and tool-call fragments and tracks
//! which field the stream is currently writing. When the stream moves on to a
//! different field, the previous one has just finished and is reported to a
//! [`StreamObserver`]. Each field is reported at most once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use tracing::debug;

use crate::observability::{STREAM_DURATION, STREAM_ERRORS};
use crate::{ChatCompletionChunk, ChatMessage, ChunkDelta, Result, ToolCall};

/// How often a stalled stream checks for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A field whose stream has finished, with its final value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishedField {
    /// The message content.
    Content(String),
    /// The refusal text.
    Refusal(String),
    /// One tool call.
    ToolCall(ToolCall),
}

/// Receives stream events as a response is accumulated.
pub trait StreamObserver {
    /// Called with every content fragment, in arrival order.
    fn on_content(&mut self, _delta: &str) {}

    /// Called exactly once for each field when it finishes.
    fn on_finished(&mut self, _field: &FinishedField) {}
}

impl StreamObserver for () {}

/// The message assembled from a complete stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedMessage {
    /// Concatenated content.
    pub content: String,
    /// Concatenated refusal, if the stream carried one.
    pub refusal: Option<String>,
    /// Tool calls ordered by stream index.
    pub tool_calls: Vec<ToolCall>,
}

impl AccumulatedMessage {
    /// Converts the message into an assistant turn.
    pub fn into_chat_message(self) -> ChatMessage {
        ChatMessage::assistant(self.content).with_tool_calls(self.tool_calls)
    }
}

/// How a drained stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The stream completed with content.
    Message(AccumulatedMessage),
    /// The stream completed but produced no content.
    Empty(AccumulatedMessage),
    /// The caller cancelled the stream; the partial message was discarded.
    Interrupted,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum FieldKey {
    Content,
    Refusal,
    ToolCall(u32),
}

#[derive(Debug, Default)]
struct ToolCallBuilder {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallBuilder {
    fn build(&self, index: u32) -> ToolCall {
        ToolCall::new(index, &self.id, &self.name, &self.arguments)
    }
}

/// Merges [`ChatCompletionChunk`]s into one message.
///
/// Only choice 0 is accumulated.
#[derive(Debug, Default)]
pub struct ChatCompletionAccumulator {
    content: String,
    saw_content: bool,
    refusal: Option<String>,
    tool_calls: BTreeMap<u32, ToolCallBuilder>,
    current: Option<FieldKey>,
    reported: BTreeSet<FieldKey>,
}

impl ChatCompletionAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one chunk.
    ///
    /// Returns the field this chunk finished, if the stream moved from one
    /// field to another. A field key that is present with empty text still
    /// counts as the stream writing that field.
    pub fn add_chunk(&mut self, chunk: &ChatCompletionChunk) -> Option<FinishedField> {
        let choice = chunk.choices.iter().find(|choice| choice.index == 0)?;
        self.apply(&choice.delta);

        let next = field_of(&choice.delta);
        if next == self.current {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, next);
        previous.and_then(|key| self.report(key))
    }

    /// Ends the stream, reporting every field not yet reported.
    ///
    /// The field still open is reported first, then any others in a fixed
    /// order: content, refusal, tool calls by index.
    pub fn finish(&mut self) -> Vec<FinishedField> {
        let mut keys: Vec<FieldKey> = self.current.take().into_iter().collect();
        if self.saw_content {
            keys.push(FieldKey::Content);
        }
        if self.refusal.is_some() {
            keys.push(FieldKey::Refusal);
        }
        keys.extend(self.tool_calls.keys().map(|index| FieldKey::ToolCall(*index)));
        keys.into_iter().filter_map(|key| self.report(key)).collect()
    }

    /// The message accumulated so far.
    pub fn message(&self) -> AccumulatedMessage {
        AccumulatedMessage {
            content: self.content.clone(),
            refusal: self.refusal.clone(),
            tool_calls: self
                .tool_calls
                .iter()
                .map(|(index, builder)| builder.build(*index))
                .collect(),
        }
    }

    /// Consumes the accumulator, yielding the final message.
    pub fn into_message(self) -> AccumulatedMessage {
        AccumulatedMessage {
            content: self.content,
            refusal: self.refusal,
            tool_calls: self
                .tool_calls
                .into_iter()
                .map(|(index, builder)| builder.build(index))
                .collect(),
        }
    }

    fn apply(&mut self, delta: &ChunkDelta) {
        if let Some(content) = &delta.content {
            self.saw_content = true;
            self.content.push_str(content);
        }
        if let Some(refusal) = &delta.refusal {
            self.refusal.get_or_insert_with(String::new).push_str(refusal);
        }
        for call in delta.tool_calls.iter().flatten() {
            let builder = self.tool_calls.entry(call.index).or_default();
            if let Some(id) = call.id.as_deref()
                && builder.id.is_empty()
            {
                builder.id = id.to_string();
            }
            if let Some(function) = &call.function {
                if let Some(name) = &function.name {
                    builder.name.push_str(name);
                }
                if let Some(arguments) = &function.arguments {
                    builder.arguments.push_str(arguments);
                }
            }
        }
    }

    fn report(&mut self, key: FieldKey) -> Option<FinishedField> {
        if !self.reported.insert(key) {
            return None;
        }
        let field = match key {
            FieldKey::Content => FinishedField::Content(self.content.clone()),
            FieldKey::Refusal => FinishedField::Refusal(self.refusal.clone().unwrap_or_default()),
            FieldKey::ToolCall(index) => FinishedField::ToolCall(
                self.tool_calls
                    .get(&index)
                    .map(|builder| builder.build(index))
                    .unwrap_or_else(|| ToolCall::new(index, "", "", "")),
            ),
        };
        Some(field)
    }
}

fn field_of(delta: &ChunkDelta) -> Option<FieldKey> {
    if delta.content.is_some() {
        Some(FieldKey::Content)
    } else if delta.refusal.is_some() {
        Some(FieldKey::Refusal)
    } else {
        delta
            .tool_calls
            .as_ref()
            .and_then(|calls| calls.first())
            .map(|call| FieldKey::ToolCall(call.index))
    }
}

/// Drains `stream`, accumulating it into a single message.
///
/// Content fragments and finished fields are reported to `observer` as they
/// happen. A transport error is returned as-is and the partial message is
/// dropped. If `cancel` becomes true the stream is dropped and
/// [`StreamOutcome::Interrupted`] is returned.
pub async fn accumulate<S>(
    mut stream: S,
    observer: &mut dyn StreamObserver,
    cancel: &AtomicBool,
) -> Result<StreamOutcome>
where
    S: Stream<Item = Result<ChatCompletionChunk>> + Unpin,
{
    let start = Instant::now();
    let mut accumulator = ChatCompletionAccumulator::new();
    let mut chunks = 0u64;

    loop {
        if cancel.load(Ordering::Relaxed) {
            debug!(chunks, "response stream cancelled");
            return Ok(StreamOutcome::Interrupted);
        }
        let next = tokio::select! {
            biased;
            item = stream.next() => item,
            _ = cancelled(cancel) => {
                debug!(chunks, "response stream cancelled");
                return Ok(StreamOutcome::Interrupted);
            }
        };
        match next {
            Some(Ok(chunk)) => {
                chunks += 1;
                if let Some(field) = accumulator.add_chunk(&chunk) {
                    observer.on_finished(&field);
                }
                if let Some(content) = chunk
                    .choices
                    .iter()
                    .find(|choice| choice.index == 0)
                    .and_then(|choice| choice.delta.content.as_deref())
                {
                    observer.on_content(content);
                }
            }
            Some(Err(err)) => {
                STREAM_ERRORS.click();
                debug!(chunks, error = %err, "response stream failed");
                return Err(err);
            }
            None => break,
        }
    }

    for field in accumulator.finish() {
        observer.on_finished(&field);
    }
    STREAM_DURATION.add(start.elapsed().as_secs_f64());

    let message = accumulator.into_message();
    debug!(
        chunks,
        content_len = message.content.len(),
        tool_calls = message.tool_calls.len(),
        "response stream complete"
    );
    if message.content.is_empty() {
        Ok(StreamOutcome::Empty(message))
    } else {
        Ok(StreamOutcome::Message(message))
    }
}

/// Resolves once `flag` is set.
pub(crate) async fn cancelled(flag: &AtomicBool) {
    while !flag.load(Ordering::Relaxed) {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}
