//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which manages conversation
//! state and handles streaming interactions with the server.

use std::sync::atomic::AtomicBool;

use tracing::debug;

use crate::accumulator::{FinishedField, StreamObserver, StreamOutcome, accumulate, cancelled};
use crate::chat::config::ChatConfig;
use crate::chat::conversation::Conversation;
use crate::client::Transport;
use crate::error::Result;
use crate::observability::{EMPTY_RESPONSES, INTERRUPTED_RESPONSES};
use crate::probe::{self, ProbeOutcome};
use crate::reasoning::{Channel, ReasoningClassifier, Segment};
use crate::render::Renderer;
use crate::types::{ChatCompletionParams, ChatMessage};

/// Seed sent with every request.
const SEED: i64 = 0;

/// A chat session that manages conversation state and server interactions.
pub struct ChatSession<T: Transport> {
    transport: T,
    config: ChatConfig,
    conversation: Conversation,
    empty_responses: u64,
    interrupted_responses: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: String,
    /// The number of turns in the conversation.
    pub turn_count: usize,
    /// Whether responses start in reasoning mode.
    pub reasoning_model: bool,
    /// The system prompt, if any.
    pub system_prompt: Option<String>,
    /// Responses that finished without content.
    pub empty_responses: u64,
    /// Responses stopped by the user.
    pub interrupted_responses: u64,
}

impl<T: Transport> ChatSession<T> {
    /// Creates a new chat session with the given transport and configuration.
    pub fn new(transport: T, config: ChatConfig) -> Self {
        Self {
            transport,
            config,
            conversation: Conversation::new(),
            empty_responses: 0,
            interrupted_responses: 0,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the conversation so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Runs the startup connectivity check against the configured model.
    pub async fn check_server(&self) -> Result<ProbeOutcome> {
        probe::check_server(&self.transport, &self.config.model, self.config.probe_deadline).await
    }

    /// Sends `prompt` and streams the response to `renderer`.
    ///
    /// The prompt and the reply are appended to the conversation together,
    /// and only when the reply has content. Setting `cancel` stops the
    /// response; nothing is appended in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the stream breaks. The
    /// conversation is left unchanged.
    pub async fn send_streaming(
        &mut self,
        prompt: &str,
        renderer: &mut dyn Renderer,
        cancel: &AtomicBool,
    ) -> Result<StreamOutcome> {
        let user = ChatMessage::user(prompt);
        let messages = self
            .conversation
            .request_messages(self.config.system_prompt.as_deref(), &user);
        let params = ChatCompletionParams::new(&self.config.model, messages)
            .with_seed(SEED)
            .with_stream(true);
        debug!(turns = self.conversation.len(), "sending prompt");

        let stream = tokio::select! {
            biased;
            stream = self.transport.stream(params) => stream?,
            _ = cancelled(cancel) => return Ok(self.interrupted(renderer)),
        };

        let initial = if self.config.reasoning_model {
            Channel::Reasoning
        } else {
            Channel::Visible
        };
        let mut printer = TurnPrinter {
            classifier: ReasoningClassifier::new(self.config.markers.clone(), initial),
            renderer: &mut *renderer,
        };
        let outcome = accumulate(stream, &mut printer, cancel).await?;
        printer.flush();

        match outcome {
            StreamOutcome::Interrupted => Ok(self.interrupted(renderer)),
            StreamOutcome::Empty(message) => {
                renderer.finish_response();
                EMPTY_RESPONSES.click();
                self.empty_responses += 1;
                debug!("response had no content; nothing appended");
                Ok(StreamOutcome::Empty(message))
            }
            StreamOutcome::Message(message) => {
                renderer.finish_response();
                self.conversation
                    .append_exchange(user, message.clone().into_chat_message());
                Ok(StreamOutcome::Message(message))
            }
        }
    }

    fn interrupted(&mut self, renderer: &mut dyn Renderer) -> StreamOutcome {
        renderer.print_interrupted();
        INTERRUPTED_RESPONSES.click();
        self.interrupted_responses += 1;
        debug!("response interrupted; nothing appended");
        StreamOutcome::Interrupted
    }

    /// Returns statistics for the current session.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            turn_count: self.conversation.len(),
            reasoning_model: self.config.reasoning_model,
            system_prompt: self.config.system_prompt.clone(),
            empty_responses: self.empty_responses,
            interrupted_responses: self.interrupted_responses,
        }
    }
}

/// Routes streamed content through the classifier to the renderer.
struct TurnPrinter<'a> {
    classifier: ReasoningClassifier,
    renderer: &'a mut dyn Renderer,
}

impl TurnPrinter<'_> {
    fn render(&mut self, segment: Segment) {
        match segment.channel {
            Channel::Reasoning => self.renderer.print_reasoning(&segment.text),
            Channel::Visible => self.renderer.print_visible(&segment.text),
        }
    }

    fn flush(&mut self) {
        if let Some(segment) = self.classifier.finish() {
            self.render(segment);
        }
    }
}

impl StreamObserver for TurnPrinter<'_> {
    fn on_content(&mut self, delta: &str) {
        for segment in self.classifier.push(delta) {
            self.render(segment);
        }
    }

    fn on_finished(&mut self, field: &FinishedField) {
        match field {
            // Content may resume; held-back marker text stays pending until the stream ends.
            FinishedField::Content(_) => {}
            FinishedField::Refusal(refusal) => self.renderer.print_refusal(refusal),
            FinishedField::ToolCall(call) => self.renderer.print_tool_call(call),
        }
    }
}
