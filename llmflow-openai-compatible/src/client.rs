//! `OpenAICompatibleClient`: the fluent builder assembling an
//! `OpenAICompatibleProvider`, grounded on the teacher's own
//! `OpenAICompatibleClient` builder shape. Since OpenAI-compatible APIs
//! don't expose pricing or capability metadata over the wire, callers
//! register each model's [`ModelInfo`] explicitly via `.model(...)` before
//! `build()`.

use std::collections::HashMap;

use llmflow_provider::model::ModelInfo;

use crate::language_model::ProviderConfig;
use crate::provider::OpenAICompatibleProvider;

#[derive(Debug, Clone, Default)]
pub struct OpenAICompatibleClient {
    base_url: Option<String>,
    name: Option<String>,
    api_key: Option<String>,
    organization: Option<String>,
    project: Option<String>,
    headers: HashMap<String, String>,
    query_params: HashMap<String, String>,
    include_usage: bool,
    models: Vec<ModelInfo>,
}

impl OpenAICompatibleClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn query_params(mut self, query_params: HashMap<String, String>) -> Self {
        self.query_params.extend(query_params);
        self
    }

    pub fn include_usage(mut self, include_usage: bool) -> Self {
        self.include_usage = include_usage;
        self
    }

    /// Registers a model this provider can resolve. Without at least one
    /// registration, `provider.model(...)` always returns `NoSuchModel`.
    pub fn model(mut self, info: ModelInfo) -> Self {
        self.models.push(info);
        self
    }

    pub fn build(self) -> OpenAICompatibleProvider {
        let base_url = self.base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let name = self.name.unwrap_or_else(|| "openai".to_string());

        let mut headers = HashMap::new();
        if let Some(key) = &self.api_key {
            headers.insert("Authorization".to_string(), format!("Bearer {key}"));
        }
        if let Some(org) = &self.organization {
            headers.insert("OpenAI-Organization".to_string(), org.clone());
        }
        if let Some(project) = &self.project {
            headers.insert("OpenAI-Project".to_string(), project.clone());
        }
        headers.extend(self.headers);

        let config = ProviderConfig {
            provider_name: name.clone(),
            base_url,
            headers,
            query_params: self.query_params,
            include_usage: self.include_usage,
            client: reqwest::Client::new(),
        };

        OpenAICompatibleProvider::new(name, config, self.models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::model::{Capabilities, Characteristics};
    use llmflow_provider::provider::Provider;

    fn sample_model(name: &str) -> ModelInfo {
        ModelInfo {
            name: name.into(),
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

    #[test]
    fn default_values_match_openai() {
        let provider = OpenAICompatibleClient::new().build();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn registered_models_are_resolvable() {
        let provider = OpenAICompatibleClient::new().api_key("test-key").model(sample_model("gpt-4o-mini")).build();
        assert!(provider.model("gpt-4o-mini").is_ok());
    }

    #[test]
    fn azure_pattern_sets_query_param_and_name() {
        let provider = OpenAICompatibleClient::new()
            .base_url("https://my-resource.openai.azure.com/openai")
            .name("azure-openai")
            .api_key("test-key")
            .query_param("api-version", "2024-02-15-preview")
            .build();

        assert_eq!(provider.name(), "azure-openai");
        assert_eq!(provider.base_url(), "https://my-resource.openai.azure.com/openai");
    }
}
