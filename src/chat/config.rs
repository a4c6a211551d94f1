//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior. Command-line arguments take
//! precedence over the environment, which takes precedence over defaults.

use std::env;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::error::{Error, Result};
use crate::probe::DEFAULT_PROBE_DEADLINE;
use crate::reasoning::{DEFAULT_CLOSE_MARKER, DEFAULT_OPEN_MARKER, ReasoningMarkers};

/// Command-line arguments for the thinkline tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: $MODEL_NAME)", "MODEL")]
    pub model: Option<String>,

    /// Base URL of the chat completions server.
    #[arrrg(optional, "Server base URL (default: $OPENAI_BASE_URL)", "URL")]
    pub base_url: Option<String>,

    /// System prompt sent ahead of every request.
    #[arrrg(optional, "System prompt for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Treat the model as one that starts its answers with reasoning.
    #[arrrg(flag, "Model opens with reasoning (default: $REASONING_MODEL)")]
    pub reasoning: bool,

    /// Text that opens a reasoning section.
    #[arrrg(optional, "Reasoning open marker (default: <think>)", "TEXT")]
    pub open_marker: Option<String>,

    /// Text that closes a reasoning section.
    #[arrrg(optional, "Reasoning close marker (default: </think>)", "TEXT")]
    pub close_marker: Option<String>,

    /// Deadline for the startup connectivity check.
    #[arrrg(optional, "Startup probe deadline in milliseconds (default: 2000)", "MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log debug output to stderr.
    #[arrrg(flag, "Enable debug logging (default: $DEBUG)")]
    pub debug: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after layering
/// command-line arguments over the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: String,

    /// Server base URL; `None` lets the client pick its default.
    pub base_url: Option<String>,

    /// Optional system prompt to set conversation context.
    pub system_prompt: Option<String>,

    /// Whether responses start in reasoning mode.
    pub reasoning_model: bool,

    /// Markers delimiting reasoning text.
    pub markers: ReasoningMarkers,

    /// How long the startup probe may run.
    pub probe_deadline: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether debug logging is enabled.
    pub debug: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig for `model` with default values.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: None,
            system_prompt: None,
            reasoning_model: false,
            markers: ReasoningMarkers::default(),
            probe_deadline: DEFAULT_PROBE_DEADLINE,
            use_color: true,
            debug: false,
        }
    }

    /// Resolves configuration from `args` and the process environment.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        Self::from_sources(args, |name| env::var(name).ok())
    }

    /// Resolves configuration from `args`, falling back to `lookup` for
    /// environment variables.
    ///
    /// Reads `MODEL_NAME`, `REASONING_MODEL`, `OPENAI_BASE_URL` and `DEBUG`.
    pub fn from_sources<F>(args: ChatArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let model = args.model.or_else(|| lookup("MODEL_NAME")).ok_or_else(|| {
            Error::validation(
                "no model configured: pass --model or set MODEL_NAME",
                Some("model".to_string()),
            )
        })?;
        let markers = ReasoningMarkers::new(
            args.open_marker.as_deref().unwrap_or(DEFAULT_OPEN_MARKER),
            args.close_marker.as_deref().unwrap_or(DEFAULT_CLOSE_MARKER),
        )?;

        Ok(ChatConfig {
            base_url: args.base_url.or_else(|| lookup("OPENAI_BASE_URL")),
            system_prompt: args.system,
            reasoning_model: args.reasoning
                || lookup("REASONING_MODEL").is_some_and(|v| is_truthy(&v)),
            markers,
            probe_deadline: args
                .probe_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_PROBE_DEADLINE),
            use_color: !args.no_color,
            debug: args.debug || lookup("DEBUG").is_some_and(|v| is_truthy(&v)),
            ..ChatConfig::new(model)
        })
    }

    /// Sets the server base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets whether responses start in reasoning mode.
    pub fn with_reasoning_model(mut self, reasoning_model: bool) -> Self {
        self.reasoning_model = reasoning_model;
        self
    }

    /// Sets the reasoning markers.
    pub fn with_markers(mut self, markers: ReasoningMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Sets the startup probe deadline.
    pub fn with_probe_deadline(mut self, deadline: Duration) -> Self {
        self.probe_deadline = deadline;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

/// Interprets an environment flag.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config() {
        let config = ChatConfig::new("qwen3");
        assert_eq!(config.model, "qwen3");
        assert!(config.base_url.is_none());
        assert!(config.system_prompt.is_none());
        assert!(!config.reasoning_model);
        assert_eq!(config.markers, ReasoningMarkers::default());
        assert_eq!(config.probe_deadline, Duration::from_secs(2));
        assert!(config.use_color);
        assert!(!config.debug);
    }

    #[test]
    fn config_from_environment() {
        let config = ChatConfig::from_sources(
            ChatArgs::default(),
            env_of(&[
                ("MODEL_NAME", "deepseek-r1"),
                ("REASONING_MODEL", "True"),
                ("OPENAI_BASE_URL", "http://localhost:8000/v3"),
                ("DEBUG", "1"),
            ]),
        )
        .unwrap();
        assert_eq!(config.model, "deepseek-r1");
        assert!(config.reasoning_model);
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8000/v3"));
        assert!(config.debug);
    }

    #[test]
    fn args_override_environment() {
        let args = ChatArgs {
            model: Some("llama3".to_string()),
            base_url: Some("http://gpu-box:8080/v1".to_string()),
            system: Some("Be brief.".to_string()),
            open_marker: Some("<reasoning>".to_string()),
            close_marker: Some("</reasoning>".to_string()),
            probe_timeout_ms: Some(500),
            no_color: true,
            ..ChatArgs::default()
        };
        let config = ChatConfig::from_sources(
            args,
            env_of(&[
                ("MODEL_NAME", "deepseek-r1"),
                ("OPENAI_BASE_URL", "http://localhost:8000/v3"),
            ]),
        )
        .unwrap();
        assert_eq!(config.model, "llama3");
        assert_eq!(config.base_url.as_deref(), Some("http://gpu-box:8080/v1"));
        assert_eq!(config.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(config.markers.open(), "<reasoning>");
        assert_eq!(config.markers.close(), "</reasoning>");
        assert_eq!(config.probe_deadline, Duration::from_millis(500));
        assert!(!config.use_color);
    }

    #[test]
    fn falsy_flags_are_off() {
        let config = ChatConfig::from_sources(
            ChatArgs::default(),
            env_of(&[
                ("MODEL_NAME", "m"),
                ("REASONING_MODEL", "False"),
                ("DEBUG", ""),
            ]),
        )
        .unwrap();
        assert!(!config.reasoning_model);
        assert!(!config.debug);
    }

    #[test]
    fn missing_model_is_rejected() {
        let err = ChatConfig::from_sources(ChatArgs::default(), env_of(&[("MODEL_NAME", " ")]))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn empty_marker_is_rejected() {
        let args = ChatArgs {
            model: Some("m".to_string()),
            close_marker: Some(String::new()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from_sources(args, env_of(&[])).is_err());
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new("m")
            .with_base_url("http://localhost:1234/v1")
            .with_system_prompt("Test prompt")
            .with_reasoning_model(true)
            .with_markers(ReasoningMarkers::new("[[", "]]").unwrap())
            .with_probe_deadline(Duration::from_secs(5))
            .without_color();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:1234/v1"));
        assert_eq!(config.system_prompt.as_deref(), Some("Test prompt"));
        assert!(config.reasoning_model);
        assert_eq!(config.markers.open(), "[[");
        assert_eq!(config.probe_deadline, Duration::from_secs(5));
        assert!(!config.use_color);
    }

    #[test]
    fn truthy_values() {
        for value in ["1", "true", "True", "YES", " on "] {
            assert!(is_truthy(value), "{value:?}");
        }
        for value in ["0", "false", "", "nope"] {
            assert!(!is_truthy(value), "{value:?}");
        }
    }
}
