//! `create_stream`: acquires a provider stream, runs it through
//! [`crate::stream::pipeline`]'s stages, and applies the content-retry
//! heuristic across whole-stream re-acquisitions, per `spec.md` §4.4.
//!
//! No teacher equivalent (the teacher's streams are a one-shot adapter
//! with no acquisition retry or content heuristic); built from
//! `spec.md` §4.4's three-step algorithm, reusing
//! [`crate::retry::execute_with_retry`] for acquisition retries.

use std::sync::Arc;

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use llmflow_provider::params::UniversalChatParams;
use llmflow_provider::provider::LanguageModel;
use llmflow_provider::response::UniversalStreamResponse;
use llmflow_provider::stream_part::ProviderStreamChunk;

use crate::error::{CoreError, RetryableErrorBuilder};
use crate::history::HistoryManager;
use crate::retry::{default_should_retry, execute_with_retry, RetryConfig};
use crate::stream::pipeline::{apply_chunk, capture_history, PipelineState};

/// Content-retry heuristic thresholds, per `spec.md` §4.4 step 3: a
/// non-JSON response under `min_chars` (including empty), or containing a
/// forbidden phrase, fails the whole acquisition attempt.
#[derive(Debug, Clone)]
pub struct ContentRetryPolicy {
    pub min_chars: usize,
    pub forbidden_phrases: Vec<String>,
}

impl Default for ContentRetryPolicy {
    fn default() -> Self {
        Self { min_chars: 200, forbidden_phrases: Vec::new() }
    }
}

impl ContentRetryPolicy {
    fn should_retry(&self, content_text: &str, is_json: bool) -> bool {
        if is_json {
            return false;
        }
        if content_text.len() < self.min_chars {
            return true;
        }
        self.forbidden_phrases.iter().any(|phrase| content_text.contains(phrase.as_str()))
    }
}

pub struct StreamConfig {
    pub retry: RetryConfig,
    pub content_retry: ContentRetryPolicy,
    pub max_history_len: usize,
}

/// Pulls one full stream to completion through the pipeline, buffering
/// every chunk: the content-retry heuristic needs the finished
/// `content_text` before it can decide whether this attempt stands, so the
/// whole attempt is collected before any chunk is handed to the caller.
async fn run_one_attempt(model: &dyn LanguageModel, params: UniversalChatParams) -> Result<Vec<UniversalStreamResponse>, CoreError> {
    let mut raw = model.stream_call(params.clone()).await?;
    let mut state = PipelineState::new();
    let mut chunks = Vec::new();
    while let Some(item) = raw.next().await {
        let chunk = item?;
        if let ProviderStreamChunk::Error { message } = &chunk {
            return Err(RetryableErrorBuilder::new(message.clone()).build());
        }
        chunks.push(apply_chunk(&mut state, chunk, &params.generation));
    }
    Ok(chunks)
}

/// `spec.md` §4.4's `createStream`: lazy until the returned stream is
/// first polled, at which point it runs the acquire → pipeline →
/// content-retry loop and yields the resulting chunks in provider order.
/// `history` receives the completed assistant message via
/// `capture_history` once a winning attempt is chosen; exactly one
/// yielded chunk carries `is_complete = true`.
pub fn create_stream<'a>(
    model: Arc<dyn LanguageModel>,
    params: UniversalChatParams,
    history: &'a mut HistoryManager,
    config: StreamConfig,
    cancel: CancellationToken,
) -> BoxStream<'a, Result<UniversalStreamResponse, CoreError>> {
    Box::pin(try_stream! {
        let is_json = params.generation.response_schema.is_some();
        let content_retry = config.content_retry.clone();
        let chunks: Vec<UniversalStreamResponse> = execute_with_retry(config.retry, &cancel, default_should_retry, || {
            let model = model.clone();
            let params = params.clone();
            let content_retry = content_retry.clone();
            async move {
                let attempt_chunks = run_one_attempt(model.as_ref(), params).await?;
                let content_text = attempt_chunks
                    .iter()
                    .rev()
                    .find(|c| c.is_complete)
                    .and_then(|c| c.content_text.as_deref())
                    .unwrap_or("");
                if content_retry.should_retry(content_text, is_json) {
                    return Err(RetryableErrorBuilder::new("stream content failed the retry heuristic").build());
                }
                Ok(attempt_chunks)
            }
        })
        .await?;

        if let Some(final_chunk) = chunks.iter().rev().find(|c| c.is_complete) {
            history.trim_to_most_recent(config.max_history_len);
            capture_history(history, final_chunk);
        }

        for chunk in chunks {
            yield chunk;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_rejects_short_text() {
        let policy = ContentRetryPolicy::default();
        assert!(policy.should_retry("", false));
        assert!(policy.should_retry("too short", false));
        assert!(!policy.should_retry(&"x".repeat(200), false));
    }

    #[test]
    fn json_responses_skip_the_length_heuristic() {
        let policy = ContentRetryPolicy::default();
        assert!(!policy.should_retry("{}", true));
    }

    #[test]
    fn forbidden_phrase_triggers_retry_even_past_min_chars() {
        let policy = ContentRetryPolicy { min_chars: 5, forbidden_phrases: vec!["as an ai".into()] };
        assert!(policy.should_retry("as an ai language model, I cannot help", false));
    }
}
