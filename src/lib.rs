// Public modules
pub mod accumulator;
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod probe;
pub mod reasoning;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use accumulator::{
    AccumulatedMessage, ChatCompletionAccumulator, FinishedField, StreamObserver, StreamOutcome,
    accumulate,
};
pub use client::{ChunkStream, Client, Transport};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use probe::{ProbeOutcome, check_server};
pub use reasoning::{Channel, ReasoningClassifier, ReasoningMarkers, Segment};
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
