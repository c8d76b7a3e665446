//! `execute`: one non-streamed provider call, with JSON-mode validation,
//! transient/content-based retry, and response post-processing, per
//! `spec.md` §4.3.
//!
//! No teacher equivalent (the teacher calls `do_generate` directly with no
//! validation/retry wrapper around it); built from `spec.md` §4.3's step
//! list, reusing [`crate::retry::execute_with_retry`] and
//! [`crate::response::{validate_json_mode, validate_response}`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use llmflow_provider::message::{Role, UniversalMessage};
use llmflow_provider::model::ModelInfo;
use llmflow_provider::params::{GenerationSettings, UniversalChatParams};
use llmflow_provider::provider::LanguageModel;
use llmflow_provider::response::{FinishReason, UniversalChatResponse};

use crate::error::{CoreError, RetryableErrorBuilder};
use crate::history::HistoryManager;
use crate::response::{validate_json_mode, validate_response, ValidatedContent};
use crate::retry::{default_should_retry, execute_with_retry, RetryConfig};

/// Content-based retry heuristic `execute` combines with transient
/// network/5xx/rate-limit retryability, per `spec.md` §4.3.
pub type ChatContentRetryPolicy = Arc<dyn Fn(&UniversalChatResponse) -> bool + Send + Sync>;

pub struct ChatConfig {
    pub retry: RetryConfig,
    pub should_retry_due_to_content: Option<ChatContentRetryPolicy>,
}

/// `spec.md` §4.3's `execute`: validates JSON-mode compatibility, merges
/// `history`'s system message into `params` if the caller didn't supply
/// one, calls the model under retry, then post-processes the response.
/// Never returns an error for a structured-output validation failure; it
/// downgrades `finish_reason` to `content-filter` and attaches the
/// validation outcome to `raw` instead.
pub async fn execute(
    model: &dyn LanguageModel,
    model_info: &ModelInfo,
    mut params: UniversalChatParams,
    history: &HistoryManager,
    config: &ChatConfig,
    cancel: &CancellationToken,
) -> Result<UniversalChatResponse, CoreError> {
    validate_json_mode(model_info, &params.generation)?;

    if let Some(system) = history.system() {
        let has_system = params.messages.iter().any(|m| matches!(m.role, Role::System));
        if !has_system {
            params.messages.insert(0, UniversalMessage::system(system));
        }
    }

    if params.messages.is_empty() {
        return Err(CoreError::InvalidPrompt { message: "no messages to send".into() });
    }

    let should_retry_due_to_content = config.should_retry_due_to_content.clone();
    let response = execute_with_retry(config.retry, cancel, default_should_retry, || {
        let params = params.clone();
        let should_retry_due_to_content = should_retry_due_to_content.clone();
        async move {
            let response = model.chat_call(params).await?;
            if let Some(predicate) = &should_retry_due_to_content {
                if predicate(&response) {
                    return Err(RetryableErrorBuilder::new("response content failed the retry heuristic").build());
                }
            }
            Ok(response)
        }
    })
    .await?;

    Ok(post_process(response, &params.generation))
}

/// ResponseProcessor's structured-output pass: on a `responseSchema`
/// request, parses/repairs/validates the raw text and records the outcome
/// in `raw` (there is no dedicated `contentObject` slot on the universal
/// envelope, so diagnostics ride along in the one field meant for
/// provider-specific extras).
fn post_process(mut response: UniversalChatResponse, generation: &GenerationSettings) -> UniversalChatResponse {
    if generation.response_schema.is_none() {
        return response;
    }
    let raw_text = response.content.as_text();
    match validate_response(&raw_text, generation, None) {
        ValidatedContent::NotRequested => response,
        ValidatedContent::Valid { content_object, json_repaired, .. } => {
            response.raw = Some(serde_json::json!({ "contentObject": content_object, "jsonRepaired": json_repaired }));
            response
        }
        ValidatedContent::Invalid { content_object, errors, finish_reason, .. } => {
            response.finish_reason = finish_reason;
            response.raw = Some(serde_json::json!({ "contentObject": content_object, "validationErrors": errors }));
            response
        }
        ValidatedContent::Unparseable { raw } => {
            response.finish_reason = FinishReason::ContentFilter;
            response.raw = Some(serde_json::json!({ "unparseable": raw }));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::error::ProviderError;
    use llmflow_provider::message::Content;
    use llmflow_provider::model::{Capabilities, Characteristics};
    use llmflow_provider::tool::ToolCall as ProviderToolCall;
    use llmflow_provider::usage::Usage;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubModel {
        calls: AtomicU32,
        replies: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl LanguageModel for StubModel {
        fn info(&self) -> &ModelInfo {
            unimplemented!()
        }

        async fn chat_call(&self, _params: UniversalChatParams) -> Result<UniversalChatResponse, ProviderError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(UniversalChatResponse {
                content: Content::Text(self.replies[index.min(self.replies.len() - 1)].to_string()),
                tool_calls: Vec::<ProviderToolCall>::new(),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
                metadata: Default::default(),
                raw: None,
            })
        }

        async fn stream_call(&self, _params: UniversalChatParams) -> Result<llmflow_provider::provider::ProviderStream, ProviderError> {
            unimplemented!()
        }
    }

    fn sample_model_info() -> ModelInfo {
        ModelInfo {
            name: "m".into(),
            input_price_per_million: 1.0,
            input_cached_price_per_million: None,
            output_price_per_million: 2.0,
            max_request_tokens: 1000,
            max_response_tokens: 100,
            tokenization_model: None,
            capabilities: Capabilities::default(),
            characteristics: Characteristics { quality_index: 50, output_speed: 50.0, first_token_latency: 100.0 },
        }
    }

    #[tokio::test]
    async fn retries_on_content_heuristic_then_succeeds() {
        let model = StubModel { calls: AtomicU32::new(0), replies: vec!["bad", "good"] };
        let info = sample_model_info();
        let params = UniversalChatParams::new(vec![UniversalMessage::user("hi")]);
        let history = HistoryManager::new(Default::default());
        let config = ChatConfig {
            retry: RetryConfig::test_mode(2),
            should_retry_due_to_content: Some(Arc::new(|r: &UniversalChatResponse| r.content.as_text() == "bad")),
        };
        let cancel = CancellationToken::new();
        let result = execute(&model, &info, params, &history, &config, &cancel).await.unwrap();
        assert_eq!(result.content.as_text(), "good");
    }

    #[tokio::test]
    async fn merges_history_system_message_when_missing() {
        let model = StubModel { calls: AtomicU32::new(0), replies: vec!["ok"] };
        let info = sample_model_info();
        let params = UniversalChatParams::new(vec![UniversalMessage::user("hi")]);
        let mut history = HistoryManager::new(Default::default());
        history.set_system("be terse");
        let config = ChatConfig { retry: RetryConfig::test_mode(0), should_retry_due_to_content: None };
        let cancel = CancellationToken::new();
        let result = execute(&model, &info, params, &history, &config, &cancel).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn empty_messages_is_rejected_without_calling_model() {
        let model = StubModel { calls: AtomicU32::new(0), replies: vec!["ok"] };
        let info = sample_model_info();
        let params = UniversalChatParams::new(vec![]);
        let history = HistoryManager::new(Default::default());
        let config = ChatConfig { retry: RetryConfig::test_mode(0), should_retry_due_to_content: None };
        let cancel = CancellationToken::new();
        let err = execute(&model, &info, params, &history, &config, &cancel).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidPrompt { .. }));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }
}
