//! `ProviderManager`: holds the caller's current provider and model name,
//! and is the only path that may swap them, per `spec.md` §5 ("the
//! provider client object is mutable only via `ProviderManager.switchProvider`").
//!
//! No teacher equivalent (the teacher's `generate_text`/`stream_text` take
//! a provider argument per call rather than holding one); grounded on
//! `llmflow_provider::provider::Provider`'s registry-style `model(name)`
//! lookup, wrapped in a name-keyed table so a caller instance can register
//! several providers and hot-swap which one is active.

use std::collections::HashMap;
use std::sync::Arc;

use llmflow_provider::provider::{LanguageModel, Provider};

use crate::error::CoreError;

/// Registry of named providers plus the currently active one.
pub struct ProviderManager {
    providers: HashMap<String, Arc<dyn Provider>>,
    current: String,
}

impl ProviderManager {
    /// Starts with `initial` registered and active.
    pub fn new(initial_name: impl Into<String>, initial: Arc<dyn Provider>) -> Self {
        let name = initial_name.into();
        let mut providers = HashMap::new();
        providers.insert(name.clone(), initial);
        Self { providers, current: name }
    }

    /// Registers a provider under `name` without changing which one is active.
    pub fn register_provider(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> Result<Arc<dyn Provider>, CoreError> {
        self.provider(&self.current)
    }

    pub fn provider(&self, name: &str) -> Result<Arc<dyn Provider>, CoreError> {
        self.providers.get(name).cloned().ok_or_else(|| CoreError::NoSuchProvider { provider_name: name.to_string() })
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Makes `name` the active provider. Fails if `name` was never
    /// registered; the previously active provider stays registered.
    pub fn switch_provider(&mut self, name: impl Into<String>) -> Result<(), CoreError> {
        let name = name.into();
        if !self.providers.contains_key(&name) {
            return Err(CoreError::NoSuchProvider { provider_name: name });
        }
        self.current = name;
        Ok(())
    }

    /// Resolves a model on the currently active provider.
    pub fn model(&self, model_name: &str) -> Result<Box<dyn LanguageModel>, CoreError> {
        Ok(self.current()?.model(model_name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::error::ProviderError;
    use llmflow_provider::model::ModelInfo;

    struct StubProvider {
        name: &'static str,
    }

    impl Provider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn available_models(&self) -> Vec<ModelInfo> {
            Vec::new()
        }

        fn model(&self, model_name: &str) -> Result<Box<dyn LanguageModel>, ProviderError> {
            Err(ProviderError::unsupported("model", model_name))
        }
    }

    #[test]
    fn switch_provider_changes_current() {
        let mut manager = ProviderManager::new("a", Arc::new(StubProvider { name: "a" }));
        manager.register_provider("b", Arc::new(StubProvider { name: "b" }));
        assert_eq!(manager.current_name(), "a");
        manager.switch_provider("b").unwrap();
        assert_eq!(manager.current_name(), "b");
    }

    #[test]
    fn switch_provider_rejects_unknown_name() {
        let mut manager = ProviderManager::new("a", Arc::new(StubProvider { name: "a" }));
        let err = manager.switch_provider("missing").unwrap_err();
        assert!(matches!(err, CoreError::NoSuchProvider { .. }));
    }

    #[test]
    fn current_after_failed_switch_is_unchanged() {
        let mut manager = ProviderManager::new("a", Arc::new(StubProvider { name: "a" }));
        let _ = manager.switch_provider("missing");
        assert_eq!(manager.current_name(), "a");
    }
}
