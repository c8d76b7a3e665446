//! Streaming pipeline: tool-call reassembly ([`buffer`]) plus the
//! composable stage chain ([`pipeline`]) and controller ([`controller`])
//! described in `spec.md` §4.4.

pub mod buffer;
pub mod controller;
pub mod pipeline;

pub use buffer::{BufferedOutput, StreamBuffer, FORCE_COMPLETE_TIMEOUT};
pub use controller::{create_stream, ContentRetryPolicy, StreamConfig};
pub use pipeline::{apply_chunk, capture_history, PipelineState};
