//! Stream pipeline stages, applied to each raw provider chunk in the order
//! `spec.md` §4.4 lists: content/tool-call split, tool-call reassembly
//! ([`StreamBuffer`]), JSON accumulation, reasoning accumulation, usage
//! attachment, and (once the stream completes) history capture.
//!
//! No teacher equivalent (the teacher's stream adapters are a thin
//! SSE-to-delta conversion with no reassembly or accumulation); built
//! directly from `spec.md` §4.4's stage list, reusing [`StreamBuffer`] for
//! the reassembly stage it composes around.

use llmflow_provider::message::{Content, UniversalMessage};
use llmflow_provider::params::GenerationSettings;
use llmflow_provider::response::{FinishReason, ResponseMetadata, UniversalStreamResponse};
use llmflow_provider::stream_part::ProviderStreamChunk;
use llmflow_provider::tool::ToolCallChunk;
use llmflow_provider::usage::Usage;

use crate::history::HistoryManager;
use crate::response::{validate_response, ValidatedContent};
use crate::stream::buffer::StreamBuffer;

/// Mutable state threaded through one stream acquisition; lives exactly as
/// long as that attempt.
pub struct PipelineState {
    buffer: StreamBuffer,
    accumulated_text: String,
    accumulated_reasoning: String,
    has_reasoning: bool,
    usage: Usage,
    metadata: ResponseMetadata,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            buffer: StreamBuffer::new(),
            accumulated_text: String::new(),
            accumulated_reasoning: String::new(),
            has_reasoning: false,
            usage: Usage::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }
}

fn base_response(state: &PipelineState) -> UniversalStreamResponse {
    UniversalStreamResponse {
        content: Content::Text(String::new()),
        tool_calls: Vec::new(),
        tool_call_chunks: Vec::new(),
        finish_reason: FinishReason::Other,
        usage: Usage::default(),
        metadata: state.metadata.clone(),
        is_complete: false,
        content_text: None,
        accumulated_reasoning: None,
        has_reasoning_content: state.has_reasoning,
    }
}

/// Runs one raw chunk through every stage and returns the chunk a
/// consumer sees for it. `generation` carries the JSON-mode settings the
/// accumulation stage needs once the stream completes.
pub fn apply_chunk(state: &mut PipelineState, chunk: ProviderStreamChunk, generation: &GenerationSettings) -> UniversalStreamResponse {
    match chunk {
        ProviderStreamChunk::Start { metadata } => {
            state.metadata = metadata;
            base_response(state)
        }
        ProviderStreamChunk::TextDelta { text } => {
            state.accumulated_text.push_str(&text);
            let buffered = state.buffer.push_chunk(&text, None);
            let mut out = base_response(state);
            out.content = Content::Text(buffered.content);
            out.tool_calls = buffered.completed_calls;
            out
        }
        ProviderStreamChunk::ReasoningDelta { text } => {
            state.has_reasoning = true;
            state.accumulated_reasoning.push_str(&text);
            let mut out = base_response(state);
            out.has_reasoning_content = true;
            out.accumulated_reasoning = Some(state.accumulated_reasoning.clone());
            out
        }
        ProviderStreamChunk::ToolCallStart { index, id, name } => {
            let buffered = state.buffer.push_chunk("", Some((id.as_deref(), Some(name.as_str()), None)));
            let mut out = base_response(state);
            out.tool_calls = buffered.completed_calls;
            out.tool_call_chunks = vec![ToolCallChunk { id, index, name: Some(name), arguments_chunk: None }];
            out
        }
        ProviderStreamChunk::ToolCallDelta { index, arguments_chunk } => {
            let buffered = state.buffer.push_chunk("", Some((None, None, Some(arguments_chunk.as_str()))));
            let mut out = base_response(state);
            out.tool_calls = buffered.completed_calls;
            out.tool_call_chunks = vec![ToolCallChunk { id: None, index, name: None, arguments_chunk: Some(arguments_chunk) }];
            out
        }
        ProviderStreamChunk::ToolCallEnd { .. } | ProviderStreamChunk::Raw { .. } => base_response(state),
        ProviderStreamChunk::Usage { usage } => {
            state.usage.accumulate(&usage);
            let mut out = base_response(state);
            out.usage = usage;
            out
        }
        ProviderStreamChunk::Finish { finish_reason } => finish_response(state, finish_reason, generation),
        ProviderStreamChunk::Error { message } => {
            let mut out = base_response(state);
            out.finish_reason = FinishReason::Error;
            out.content_text = Some(message);
            out
        }
    }
}

/// JsonAccumulator + UsageAttacher, run together on the chunk that ends
/// the stream: attaches the full `content_text`, the final `usage`, and
/// (for schema-constrained responses) downgrades `finish_reason` to
/// `content-filter` if the accumulated text doesn't validate.
fn finish_response(state: &PipelineState, finish_reason: FinishReason, generation: &GenerationSettings) -> UniversalStreamResponse {
    let mut out = base_response(state);
    out.is_complete = true;
    out.content_text = Some(state.accumulated_text.clone());
    out.usage = state.usage;
    if !state.accumulated_reasoning.is_empty() {
        out.accumulated_reasoning = Some(state.accumulated_reasoning.clone());
    }
    out.finish_reason = if generation.response_schema.is_some() {
        match validate_response(&state.accumulated_text, generation, None) {
            ValidatedContent::Invalid { .. } | ValidatedContent::Unparseable { .. } => FinishReason::ContentFilter,
            _ => finish_reason,
        }
    } else {
        finish_reason
    };
    out
}

/// HistoryCapturer: appends the completed assistant message unless the
/// stream finished on tool calls, which `tool::orchestrator::run` handles
/// instead by appending its own tool-result messages.
pub fn capture_history(history: &mut HistoryManager, final_chunk: &UniversalStreamResponse) {
    if final_chunk.finish_reason == FinishReason::ToolCalls || !final_chunk.tool_calls.is_empty() {
        return;
    }
    if let Some(text) = &final_chunk.content_text {
        if !text.is_empty() {
            history.add_message(UniversalMessage::assistant(text.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_deltas_accumulate_into_final_content_text() {
        let mut state = PipelineState::new();
        let generation = GenerationSettings::default();
        apply_chunk(&mut state, ProviderStreamChunk::TextDelta { text: "hello ".into() }, &generation);
        apply_chunk(&mut state, ProviderStreamChunk::TextDelta { text: "world".into() }, &generation);
        let last = apply_chunk(&mut state, ProviderStreamChunk::Finish { finish_reason: FinishReason::Stop }, &generation);
        assert!(last.is_complete);
        assert_eq!(last.content_text.as_deref(), Some("hello world"));
        assert_eq!(last.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn invalid_json_downgrades_finish_reason_to_content_filter() {
        let mut state = PipelineState::new();
        let generation = GenerationSettings { response_schema: Some(serde_json::json!({"type": "object"})), ..Default::default() };
        apply_chunk(&mut state, ProviderStreamChunk::TextDelta { text: "not json".into() }, &generation);
        let last = apply_chunk(&mut state, ProviderStreamChunk::Finish { finish_reason: FinishReason::Stop }, &generation);
        assert_eq!(last.finish_reason, FinishReason::ContentFilter);
    }

    #[test]
    fn history_capture_skips_tool_call_finishes() {
        let mut history = HistoryManager::new(Default::default());
        let mut chunk = base_response(&PipelineState::new());
        chunk.finish_reason = FinishReason::ToolCalls;
        chunk.content_text = Some("irrelevant".into());
        capture_history(&mut history, &chunk);
        assert!(history.is_empty());
    }

    #[test]
    fn history_capture_appends_plain_text_finish() {
        let mut history = HistoryManager::new(Default::default());
        let mut chunk = base_response(&PipelineState::new());
        chunk.finish_reason = FinishReason::Stop;
        chunk.content_text = Some("final answer".into());
        capture_history(&mut history, &chunk);
        assert_eq!(history.len(), 1);
    }
}
