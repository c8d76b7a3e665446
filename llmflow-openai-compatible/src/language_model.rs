//! `OpenAICompatibleLanguageModel`: one callable model handle, grounded on
//! the teacher's `chat_language_model.rs` request/response plumbing but
//! implementing `llmflow_provider::provider::LanguageModel` over the
//! universal envelope instead of the teacher's own call-options shape.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use llmflow_provider::error::{ApiCallErrorBuilder, ProviderError};
use llmflow_provider::model::ModelInfo;
use llmflow_provider::params::UniversalChatParams;
use llmflow_provider::provider::{LanguageModel, ProviderStream};
use llmflow_provider::response::UniversalChatResponse;

use crate::chat::api_types::WireResponse;
use crate::chat::convert::{convert_from_provider_response, convert_to_provider_params};
use crate::chat::stream::provider_stream_chunks;
use crate::error::map_error_response;

/// Shared, cheaply-cloneable connection settings every model handle from
/// one provider instance carries.
pub struct ProviderConfig {
    pub provider_name: String,
    pub base_url: String,
    pub headers: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub include_usage: bool,
    pub client: reqwest::Client,
}

impl ProviderConfig {
    fn chat_completions_url(&self) -> String {
        let base = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        if self.query_params.is_empty() {
            return base;
        }
        let query: String = self.query_params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
        format!("{base}?{query}")
    }
}

pub struct OpenAICompatibleLanguageModel {
    info: ModelInfo,
    config: Arc<ProviderConfig>,
}

impl OpenAICompatibleLanguageModel {
    pub fn new(info: ModelInfo, config: Arc<ProviderConfig>) -> Self {
        Self { info, config }
    }

    fn build_request(&self, params: &UniversalChatParams, stream: bool) -> reqwest::RequestBuilder {
        let body = convert_to_provider_params(&self.info.name, params, stream, self.config.include_usage);
        let mut request = self.config.client.post(self.config.chat_completions_url()).json(&body);
        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }
        request
    }
}

#[async_trait]
impl LanguageModel for OpenAICompatibleLanguageModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn chat_call(&self, params: UniversalChatParams) -> Result<UniversalChatResponse, ProviderError> {
        if params.messages.is_empty() {
            return Err(ProviderError::InvalidPrompt { message: "no messages to send".into() });
        }

        let url = self.config.chat_completions_url();
        let response = self
            .build_request(&params, false)
            .send()
            .await
            .map_err(|e| ApiCallErrorBuilder::new(e.to_string(), url.clone()).is_retryable(true).source(e).build())?;

        if !response.status().is_success() {
            return Err(map_error_response(&url, response).await);
        }

        let body: WireResponse =
            response.json().await.map_err(|e| ProviderError::InvalidResponseData { message: e.to_string(), data: String::new() })?;
        convert_from_provider_response(&self.config.provider_name, &self.info.name, body)
            .map_err(|message| ProviderError::InvalidResponseData { message, data: String::new() })
    }

    async fn stream_call(&self, params: UniversalChatParams) -> Result<ProviderStream, ProviderError> {
        if params.messages.is_empty() {
            return Err(ProviderError::InvalidPrompt { message: "no messages to send".into() });
        }

        let url = self.config.chat_completions_url();
        let response = self
            .build_request(&params, true)
            .send()
            .await
            .map_err(|e| ApiCallErrorBuilder::new(e.to_string(), url.clone()).is_retryable(true).source(e).build())?;

        if !response.status().is_success() {
            return Err(map_error_response(&url, response).await);
        }

        Ok(Box::pin(provider_stream_chunks(response.bytes_stream())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::model::{Capabilities, Characteristics};

    fn sample_info() -> ModelInfo {
        ModelInfo {
            name: "gpt-4o-mini".into(),
            input_price_per_million: 0.15,
            input_cached_price_per_million: None,
            output_price_per_million: 0.6,
            max_request_tokens: 128_000,
            max_response_tokens: 16_384,
            tokenization_model: None,
            capabilities: Capabilities::default(),
            characteristics: Characteristics { quality_index: 70, output_speed: 120.0, first_token_latency: 500.0 },
        }
    }

    fn sample_config() -> Arc<ProviderConfig> {
        Arc::new(ProviderConfig {
            provider_name: "openai-compatible".into(),
            base_url: "https://api.openai.com/v1".into(),
            headers: HashMap::new(),
            query_params: HashMap::new(),
            include_usage: false,
            client: reqwest::Client::new(),
        })
    }

    #[tokio::test]
    async fn empty_messages_fail_before_any_network_call() {
        let model = OpenAICompatibleLanguageModel::new(sample_info(), sample_config());
        let err = model.chat_call(UniversalChatParams::new(vec![])).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidPrompt { .. }));
    }

    #[test]
    fn chat_completions_url_appends_query_params() {
        let mut config = ProviderConfig {
            provider_name: "azure".into(),
            base_url: "https://my-resource.openai.azure.com/openai".into(),
            headers: HashMap::new(),
            query_params: HashMap::new(),
            include_usage: false,
            client: reqwest::Client::new(),
        };
        config.query_params.insert("api-version".into(), "2024-02-15-preview".into());
        assert_eq!(
            config.chat_completions_url(),
            "https://my-resource.openai.azure.com/openai/chat/completions?api-version=2024-02-15-preview"
        );
    }
}
