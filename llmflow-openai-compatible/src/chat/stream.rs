//! Turns a byte stream of `/chat/completions` SSE events into a stream of
//! [`ProviderStreamChunk`]s, grounded on the teacher's `process_stream`
//! buffering loop in `chat_language_model.rs` but reusing
//! `llmflow-provider-utils`'s shared SSE framing instead of reimplementing
//! line-buffering here.

use std::collections::HashMap;

use async_stream::stream;
use bytes::Bytes;
use futures::Stream;
use llmflow_provider::error::ProviderError;
use llmflow_provider::response::ResponseMetadata;
use llmflow_provider::stream_part::ProviderStreamChunk;
use llmflow_provider_utils::sse::{SseEvent, sse_events};

use super::api_types::WireStreamChunk;
use super::convert::map_finish_reason;

/// Wraps a raw response byte stream into the universal chunk stream a
/// `LanguageModel::stream_call` returns.
pub fn provider_stream_chunks(
    byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = Result<ProviderStreamChunk, ProviderError>> + Send {
    stream! {
        let mut events = Box::pin(sse_events(byte_stream));
        let mut tool_names: HashMap<usize, String> = HashMap::new();
        let mut sent_start = false;

        while let Some(event) = futures_util::StreamExt::next(&mut events).await {
            let data = match event {
                Ok(SseEvent::Data(data)) => data,
                Err(e) => {
                    yield Err(ProviderError::StreamError { message: e.to_string() });
                    continue;
                }
            };

            let chunk: WireStreamChunk = match serde_json::from_str(&data) {
                Ok(c) => c,
                Err(e) => {
                    yield Err(ProviderError::StreamError { message: format!("malformed stream chunk: {e}") });
                    continue;
                }
            };

            if !sent_start {
                sent_start = true;
                yield Ok(ProviderStreamChunk::Start { metadata: ResponseMetadata::default() });
            }

            let Some(choice) = chunk.choices.first() else {
                if let Some(usage) = chunk.usage {
                    yield Ok(ProviderStreamChunk::Usage { usage: super::convert::usage_from_wire(&usage) });
                }
                continue;
            };

            if let Some(text) = &choice.delta.content {
                if !text.is_empty() {
                    yield Ok(ProviderStreamChunk::TextDelta { text: text.clone() });
                }
            }

            if let Some(reasoning) = &choice.delta.reasoning_content {
                if !reasoning.is_empty() {
                    yield Ok(ProviderStreamChunk::ReasoningDelta { text: reasoning.clone() });
                }
            }

            if let Some(tool_calls) = &choice.delta.tool_calls {
                for call in tool_calls {
                    let name_declared = tool_names.contains_key(&call.index);
                    if let Some(function) = &call.function {
                        if let Some(name) = &function.name {
                            if !name_declared {
                                tool_names.insert(call.index, name.clone());
                                yield Ok(ProviderStreamChunk::ToolCallStart { index: call.index, id: call.id.clone(), name: name.clone() });
                            }
                        }
                        if let Some(arguments_chunk) = &function.arguments {
                            if !arguments_chunk.is_empty() {
                                yield Ok(ProviderStreamChunk::ToolCallDelta { index: call.index, arguments_chunk: arguments_chunk.clone() });
                            }
                        }
                    }
                }
            }

            if let Some(raw_reason) = &choice.finish_reason {
                for index in tool_names.keys() {
                    yield Ok(ProviderStreamChunk::ToolCallEnd { index: *index });
                }
                yield Ok(ProviderStreamChunk::Finish { finish_reason: map_finish_reason(Some(raw_reason)) });
            }

            if let Some(usage) = chunk.usage {
                yield Ok(ProviderStreamChunk::Usage { usage: super::convert::usage_from_wire(&usage) });
            }
        }
    }
}
