//! `ProviderStreamChunk`, the raw tagged variant a `LanguageModel`'s stream
//! yields before `llmflow-core`'s pipeline stages normalize it.
//!
//! Grounded on `ai-sdk-provider/src/language_model/stream_part.rs`'s
//! tagged-union stream part enum, trimmed to the variants `spec.md` §4.4's
//! `StreamController` actually switches on and renamed to the universal
//! vocabulary (`TextDelta` rather than teacher-specific part names).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::response::{FinishReason, ResponseMetadata};
use crate::usage::Usage;

/// One chunk yielded by a provider adapter's raw stream, prior to any
/// pipeline-stage processing (accumulation, reassembly, repair).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProviderStreamChunk {
    /// Stream has started; carries whatever identifying metadata the
    /// provider sends up front (request id, model echoed back, ...).
    Start { metadata: ResponseMetadata },
    /// An incremental slice of assistant-visible text.
    TextDelta { text: String },
    /// An incremental slice of the model's reasoning/thinking trace,
    /// kept separate from `TextDelta` since it is never part of the
    /// user-visible response content.
    ReasoningDelta { text: String },
    /// A tool call has begun; `index` identifies it among parallel calls.
    ToolCallStart { index: usize, id: Option<String>, name: String },
    /// An incremental slice of a tool call's JSON arguments.
    ToolCallDelta { index: usize, arguments_chunk: String },
    /// A tool call's arguments are fully received.
    ToolCallEnd { index: usize },
    /// Usage accounting became available (commonly on the final chunk, but
    /// some providers emit partial usage mid-stream).
    Usage { usage: Usage },
    /// The stream has finished.
    Finish { finish_reason: FinishReason },
    /// A provider-specific chunk the core doesn't need to interpret, kept
    /// for diagnostics and passthrough into `raw`.
    Raw { value: Value },
    /// The provider reported an error mid-stream.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_delta_round_trips_through_json() {
        let chunk = ProviderStreamChunk::TextDelta { text: "hi".into() };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["kind"], "textDelta");
        let back: ProviderStreamChunk = serde_json::from_value(json).unwrap();
        assert_eq!(chunk, back);
    }
}
