//! Splits streamed content into reasoning and visible text.
//!
//! Reasoning models wrap their deliberation in marker literals such as
//! `<think>` and `</think>`. The server streams those markers like any other
//! text, so a marker may arrive split over several fragments. The
//! [`ReasoningClassifier`] holds back only the shortest tail that could still
//! grow into the marker it is looking for, and routes everything else as soon
//! as it arrives.
//!
//! Markers are rendered, not stripped: the text up to and including a marker
//! goes to the channel that was active when the marker was found.

use crate::{Error, Result};

/// Default marker that opens a reasoning segment.
pub const DEFAULT_OPEN_MARKER: &str = "<think>";

/// Default marker that closes a reasoning segment.
pub const DEFAULT_CLOSE_MARKER: &str = "</think>";

/// The output channel a piece of content is routed to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Model-internal deliberation.
    Reasoning,
    /// The user-facing answer.
    Visible,
}

impl Channel {
    fn flipped(self) -> Self {
        match self {
            Channel::Reasoning => Channel::Visible,
            Channel::Visible => Channel::Reasoning,
        }
    }
}

/// A run of text routed to a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Where the text goes.
    pub channel: Channel,
    /// The text itself.
    pub text: String,
}

impl Segment {
    fn new(channel: Channel, text: &str) -> Self {
        Self {
            channel,
            text: text.to_string(),
        }
    }
}

/// The literals that open and close a reasoning segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningMarkers {
    open: String,
    close: String,
}

impl ReasoningMarkers {
    /// Creates a marker pair. Both markers must be non-empty.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self> {
        let open = open.into();
        let close = close.into();
        if open.is_empty() {
            return Err(Error::validation(
                "open marker must not be empty",
                Some("open_marker".to_string()),
            ));
        }
        if close.is_empty() {
            return Err(Error::validation(
                "close marker must not be empty",
                Some("close_marker".to_string()),
            ));
        }
        Ok(Self { open, close })
    }

    /// The marker that switches to [`Channel::Reasoning`].
    pub fn open(&self) -> &str {
        &self.open
    }

    /// The marker that switches to [`Channel::Visible`].
    pub fn close(&self) -> &str {
        &self.close
    }
}

impl Default for ReasoningMarkers {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN_MARKER.to_string(),
            close: DEFAULT_CLOSE_MARKER.to_string(),
        }
    }
}

/// Incremental reasoning/visible splitter for one response.
///
/// Create one per response. Feed every content fragment to [`push`] in order,
/// then call [`finish`] once the stream has ended.
///
/// [`push`]: ReasoningClassifier::push
/// [`finish`]: ReasoningClassifier::finish
#[derive(Debug, Clone)]
pub struct ReasoningClassifier {
    markers: ReasoningMarkers,
    mode: Channel,
    pending: String,
}

impl ReasoningClassifier {
    /// Creates a classifier that starts routing to `initial`.
    ///
    /// Start in [`Channel::Reasoning`] for models that begin with deliberation
    /// and may omit the open marker.
    pub fn new(markers: ReasoningMarkers, initial: Channel) -> Self {
        Self {
            markers,
            mode: initial,
            pending: String::new(),
        }
    }

    /// The channel text is currently routed to.
    pub fn mode(&self) -> Channel {
        self.mode
    }

    /// Text held back because it may be the start of a marker.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Routes one content fragment.
    ///
    /// Returns the segments that can be emitted now, in order. A single
    /// fragment may switch modes several times.
    pub fn push(&mut self, delta: &str) -> Vec<Segment> {
        let mut text = std::mem::take(&mut self.pending);
        text.push_str(delta);

        let mut segments = Vec::new();
        let mut rest = text.as_str();
        loop {
            let marker = match self.mode {
                Channel::Visible => self.markers.open.as_str(),
                Channel::Reasoning => self.markers.close.as_str(),
            };
            if let Some(pos) = rest.find(marker) {
                let end = pos + marker.len();
                emit(&mut segments, self.mode, &rest[..end]);
                self.mode = self.mode.flipped();
                rest = &rest[end..];
            } else {
                let split = rest.len() - partial_marker_len(rest, marker);
                emit(&mut segments, self.mode, &rest[..split]);
                self.pending = rest[split..].to_string();
                return segments;
            }
        }
    }

    /// Flushes held-back text at the end of the stream.
    ///
    /// A partial marker at the very end is not a marker; it goes to the
    /// current channel verbatim.
    pub fn finish(&mut self) -> Option<Segment> {
        if self.pending.is_empty() {
            None
        } else {
            let text = std::mem::take(&mut self.pending);
            Some(Segment {
                channel: self.mode,
                text,
            })
        }
    }
}

fn emit(segments: &mut Vec<Segment>, channel: Channel, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::new(channel, text));
    }
}

/// Length of the longest proper prefix of `marker` that `text` ends with.
fn partial_marker_len(text: &str, marker: &str) -> usize {
    let longest = marker.len().saturating_sub(1).min(text.len());
    (1..=longest)
        .rev()
        .find(|&n| {
            let start = text.len() - n;
            text.is_char_boundary(start) && marker.starts_with(&text[start..])
        })
        .unwrap_or(0)
}
