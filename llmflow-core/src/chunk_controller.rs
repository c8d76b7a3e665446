//! `ChunkController`: sequential per-chunk execution over the prompts a
//! [`crate::splitter`] split produced, with a hard iteration ceiling.
//!
//! No teacher equivalent (the teacher sends one prompt per call); built
//! from `spec.md` §4.6's `processChunks`/`streamChunks` contract. Takes
//! the chat/stream execution step as an injected async closure rather
//! than depending on a concrete `ChatController`/`StreamController`
//! type, the same seam `crate::retry::execute_with_retry` uses for its
//! `op` parameter.

use futures::stream::{self, BoxStream, StreamExt};
use llmflow_provider::response::UniversalChatResponse;
use llmflow_provider::stream_part::ProviderStreamChunk;

use crate::error::CoreError;

/// Default ceiling on the number of chunks processed before
/// `chunk-iteration-limit` fires.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Runs one chat turn per chunk in `chunks`, sequentially, failing with
/// [`CoreError::ChunkIterationLimit`] if `chunks.len()` would exceed
/// `max_iterations`. `execute_chunk(chunk)` is expected to add the
/// chunk's content to history itself before calling the provider.
pub async fn process_chunks<F, Fut>(
    chunks: &[String],
    max_iterations: u32,
    mut execute_chunk: F,
) -> Result<Vec<UniversalChatResponse>, CoreError>
where
    F: FnMut(&str) -> Fut,
    Fut: std::future::Future<Output = Result<UniversalChatResponse, CoreError>>,
{
    if chunks.len() as u32 > max_iterations {
        return Err(CoreError::ChunkIterationLimit { limit: max_iterations });
    }

    let mut responses = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        responses.push(execute_chunk(chunk).await?);
    }
    Ok(responses)
}

/// `spec.md` §4.6's `streamChunks`: runs one stream per prompt in
/// `chunks`, sequentially, forcing `Finish` chunks to read as
/// incomplete except on the very last prompt's very last chunk.
pub async fn stream_chunks<'a, F>(
    chunks: &'a [String],
    max_iterations: u32,
    mut stream_chunk: F,
) -> Result<BoxStream<'a, Result<ProviderStreamChunk, CoreError>>, CoreError>
where
    F: FnMut(&str) -> BoxStream<'a, Result<ProviderStreamChunk, CoreError>> + Send + 'a,
{
    if chunks.len() as u32 > max_iterations {
        return Err(CoreError::ChunkIterationLimit { limit: max_iterations });
    }

    let last_index = chunks.len().saturating_sub(1);
    let combined = stream::iter(chunks.iter().enumerate())
        .flat_map(move |(i, chunk)| {
            let is_last_prompt = i == last_index;
            stream_chunk(chunk).map(move |item| item.map(|c| rewrite_completion(c, is_last_prompt)))
        })
        .boxed();

    Ok(combined)
}

fn rewrite_completion(chunk: ProviderStreamChunk, is_last_prompt: bool) -> ProviderStreamChunk {
    if is_last_prompt {
        return chunk;
    }
    match chunk {
        ProviderStreamChunk::Finish { .. } => ProviderStreamChunk::TextDelta { text: String::new() },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::message::Content;
    use llmflow_provider::response::{FinishReason, ResponseMetadata};
    use llmflow_provider::usage::Usage;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sample_response() -> UniversalChatResponse {
        UniversalChatResponse {
            content: Content::Text("ok".into()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            metadata: ResponseMetadata::default(),
            raw: None,
        }
    }

    #[tokio::test]
    async fn processes_every_chunk_in_order() {
        let chunks = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let calls = AtomicU32::new(0);
        let responses = process_chunks(&chunks, DEFAULT_MAX_ITERATIONS, |_c| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(sample_response()) }
        })
        .await
        .unwrap();
        assert_eq!(responses.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exceeding_max_iterations_fails_fast() {
        let chunks: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        let result = process_chunks(&chunks, 3, |_c| async { Ok(sample_response()) }).await;
        assert!(matches!(result, Err(CoreError::ChunkIterationLimit { limit: 3 })));
    }
}
