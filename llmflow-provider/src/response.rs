//! `UniversalChatResponse`/`UniversalStreamResponse` and their finish
//! reason/metadata sub-shapes.
//!
//! Grounded on `ai-sdk-provider/src/language_model/finish_reason.rs` and
//! `.../generate_result.rs`, reshaped into a single generic envelope that
//! either carries raw text or (via the `T` parameter) a repaired/validated
//! structured payload — the teacher keeps those as two separate result
//! types, but `spec.md` §4.9's `ResponseProcessor` produces one or the
//! other from the same pipeline, so a generic fits its output better.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Content;
use crate::tool::{ToolCall, ToolCallChunk};
use crate::usage::Usage;

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    Other,
}

/// Provider- and request-identifying metadata carried alongside a response,
/// used for tracing span attributes and for the history manager's audit
/// trail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
}

/// A complete (non-streamed) chat response. `T` is `String` for plain text
/// output and a caller-chosen deserialized type for schema-validated JSON
/// output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalChatResponse<T = Content> {
    pub content: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl<T> UniversalChatResponse<T> {
    pub fn map_content<U>(self, f: impl FnOnce(T) -> U) -> UniversalChatResponse<U> {
        UniversalChatResponse {
            content: f(self.content),
            tool_calls: self.tool_calls,
            finish_reason: self.finish_reason,
            usage: self.usage,
            metadata: self.metadata,
            raw: self.raw,
        }
    }
}

/// One chunk of a streamed response, per `spec.md` §3's invariant: exactly
/// one chunk per logical response has `is_complete=true`, and only that
/// chunk's `content_text` holds the full accumulated text. Intermediate
/// chunks carry only `content` deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalStreamResponse {
    pub content: Content,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_chunks: Vec<ToolCallChunk>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulated_reasoning: Option<String>,
    #[serde(default)]
    pub has_reasoning_content: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_content_preserves_other_fields() {
        let resp: UniversalChatResponse<String> = UniversalChatResponse {
            content: "raw text".to_string(),
            tool_calls: vec![],
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            metadata: ResponseMetadata::default(),
            raw: None,
        };
        let mapped = resp.map_content(|s| s.len());
        assert_eq!(mapped.content, 8);
        assert_eq!(mapped.finish_reason, FinishReason::Stop);
    }
}
