//! `ModelRegistry`: an in-memory map from model name to [`ModelInfo`],
//! scoped per provider.
//!
//! Grounded on the teacher's provider-holds-its-own-models pattern (each
//! `ai-sdk-*` crate's `Provider` impl enumerates its own model table);
//! generalized into a standalone registry since `spec.md` §4.1's
//! `ModelSelector` needs to query across a provider's full model set
//! rather than through trait-object dispatch.

use std::collections::HashMap;

use llmflow_provider::model::ModelInfo;

use crate::error::CoreError;

/// Per-provider model table, mutated only through [`Self::update_model`]
/// once populated — matching the "created at provider init, mutated only
/// through explicit updateModel" lifecycle rule.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelInfo>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_models(models: impl IntoIterator<Item = ModelInfo>) -> Self {
        let mut registry = Self::new();
        for model in models {
            registry.insert(model);
        }
        registry
    }

    pub fn insert(&mut self, model: ModelInfo) {
        self.models.insert(model.name.clone(), model);
    }

    pub fn get(&self, name: &str) -> Result<&ModelInfo, CoreError> {
        self.models.get(name).ok_or_else(|| CoreError::NoSuchModel { model_name: name.to_string() })
    }

    pub fn all(&self) -> impl Iterator<Item = &ModelInfo> {
        self.models.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    /// Replaces the entry for `model.name`, the only mutation path once
    /// the registry is populated.
    pub fn update_model(&mut self, model: ModelInfo) {
        self.insert(model);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
