use serde::{Deserialize, Serialize};

/// One server-sent fragment of a streamed chat completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Identifier shared by every chunk of one completion.
    #[serde(default)]
    pub id: String,

    /// The model that produced the chunk.
    #[serde(default)]
    pub model: String,

    /// Per-choice deltas. Servers send an empty list on usage-only chunks.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// The delta for one choice within a chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Which choice this delta belongs to.
    #[serde(default)]
    pub index: u32,

    /// The incremental payload.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Set on the last chunk of the choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Incremental message fields.
///
/// A field that is `Some` was present in the fragment, even when its text is
/// empty; presence is what drives completion tracking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Text content appended by this fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Refusal text appended by this fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,

    /// Tool-call fragments, keyed by their `index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// A fragment of one tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Slot this fragment belongs to.
    #[serde(default)]
    pub index: u32,

    /// Call identifier; usually only on the first fragment of a slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Function name and argument text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionDelta>,
}

/// Function fields of a tool-call fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDelta {
    /// Function name fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Argument JSON fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl ChatCompletionChunk {
    /// A chunk whose first choice carries `delta`.
    pub fn with_delta(delta: ChunkDelta) -> Self {
        Self {
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason: None,
            }],
            ..Self::default()
        }
    }

    /// A chunk carrying a content fragment.
    pub fn content(text: impl Into<String>) -> Self {
        Self::with_delta(ChunkDelta {
            content: Some(text.into()),
            ..ChunkDelta::default()
        })
    }

    /// A chunk carrying a refusal fragment.
    pub fn refusal(text: impl Into<String>) -> Self {
        Self::with_delta(ChunkDelta {
            refusal: Some(text.into()),
            ..ChunkDelta::default()
        })
    }

    /// A chunk carrying one tool-call fragment.
    pub fn tool_call(
        index: u32,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> Self {
        Self::with_delta(ChunkDelta {
            tool_calls: Some(vec![ToolCallDelta {
                index,
                id: id.map(String::from),
                function: Some(FunctionDelta {
                    name: name.map(String::from),
                    arguments: arguments.map(String::from),
                }),
            }]),
            ..ChunkDelta::default()
        })
    }

    /// The terminal chunk: an empty delta and a finish reason.
    pub fn finish(reason: impl Into<String>) -> Self {
        let mut chunk = Self::with_delta(ChunkDelta::default());
        chunk.choices[0].finish_reason = Some(reason.into());
        chunk
    }

    /// The delta of the first choice, if the chunk has one.
    pub fn first_delta(&self) -> Option<&ChunkDelta> {
        self.choices.first().map(|choice| &choice.delta)
    }
}
