//! `OpenAICompatibleProvider`: implements `llmflow_provider::provider::Provider`
//! over a registry of models this adapter was told about at build time,
//! grounded on the teacher's `create_chat_config`/`OpenAICompatibleProvider`
//! header/URL wiring but without the teacher's per-modality config structs,
//! since this adapter only serves chat+streaming.

use std::collections::HashMap;
use std::sync::Arc;

use llmflow_provider::error::ProviderError;
use llmflow_provider::model::ModelInfo;
use llmflow_provider::provider::{LanguageModel, Provider};

use crate::language_model::{OpenAICompatibleLanguageModel, ProviderConfig};

pub struct OpenAICompatibleProvider {
    name: String,
    config: Arc<ProviderConfig>,
    models: HashMap<String, ModelInfo>,
}

impl OpenAICompatibleProvider {
    pub fn new(name: String, config: ProviderConfig, models: Vec<ModelInfo>) -> Self {
        Self { name, config: Arc::new(config), models: models.into_iter().map(|m| (m.name.clone(), m)).collect() }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

impl Provider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        self.models.values().cloned().collect()
    }

    fn model(&self, model_name: &str) -> Result<Box<dyn LanguageModel>, ProviderError> {
        let info = self.models.get(model_name).cloned().ok_or_else(|| ProviderError::no_such_model(model_name, &self.name))?;
        Ok(Box::new(OpenAICompatibleLanguageModel::new(info, self.config.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::model::{Capabilities, Characteristics};

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

    fn sample_config() -> ProviderConfig {
        ProviderConfig {
            provider_name: "openai".into(),
            base_url: "https://api.openai.com/v1".into(),
            headers: HashMap::new(),
            query_params: HashMap::new(),
            include_usage: false,
            client: reqwest::Client::new(),
        }
    }

    #[test]
    fn resolves_a_registered_model() {
        let provider = OpenAICompatibleProvider::new("openai".into(), sample_config(), vec![sample_model("gpt-4o-mini")]);
        assert!(provider.model("gpt-4o-mini").is_ok());
        assert_eq!(provider.available_models().len(), 1);
    }

    #[test]
    fn unregistered_model_is_no_such_model() {
        let provider = OpenAICompatibleProvider::new("openai".into(), sample_config(), vec![]);
        let err = match provider.model("unknown") {
            Err(err) => err,
            Ok(_) => panic!("expected model lookup to fail"),
        };
        assert!(matches!(err, ProviderError::NoSuchModel { .. }));
    }
}
