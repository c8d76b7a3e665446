//! `UniversalChatParams` and the settings it carries.
//!
//! Grounded on `ai-sdk-provider/src/language_model/call_options.rs`'s flat
//! `LanguageModelCallOptions`, split here into a `generation` block (vendor-
//! portable sampling knobs) and a `library` block (orchestration-only
//! knobs the provider never sees), matching the `spec.md` §3 distinction
//! between what crosses the wire and what governs the core's own behavior.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::UniversalMessage;
use crate::tool::ToolDefinition;

/// How much of the running conversation history is sent on each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryMode {
    /// The full message history is resent every call.
    Full,
    /// The history manager may summarize or truncate older turns.
    Dynamic,
}

impl Default for HistoryMode {
    fn default() -> Self {
        Self::Full
    }
}

/// How strongly structured JSON output is enforced when a response schema
/// is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JsonMode {
    /// Only use the provider's native structured-output feature; never
    /// attempt prompt-based repair if the model ignores the schema.
    NativeOnly,
    /// Prefer native structured output, falling back to schema repair on
    /// parse or validation failure.
    Fallback,
    /// Skip native structured output and rely entirely on prompting plus
    /// schema repair.
    ForcePrompt,
}

impl Default for JsonMode {
    fn default() -> Self {
        Self::Fallback
    }
}

/// Vendor-portable sampling and shape controls, forwarded into the
/// provider adapter's wire request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_mode: Option<JsonMode>,
}

/// Orchestration-only controls the provider adapter never sees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySettings {
    #[serde(default)]
    pub history_mode: HistoryMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tool_call_steps: Option<u32>,
    #[serde(default)]
    pub emit_usage_events: bool,
}

/// The single input to `Provider::chat_call`/`stream_call`: history,
/// tools, and the two settings blocks above.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalChatParams {
    pub messages: Vec<UniversalMessage>,
    #[serde(skip)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub library: LibrarySettings,
}

impl PartialEq for UniversalChatParams {
    /// Tool callables aren't comparable, so equality ignores `tools` and
    /// compares everything the wire envelope actually carries.
    fn eq(&self, other: &Self) -> bool {
        self.messages == other.messages && self.generation == other.generation && self.library == other.library
    }
}

impl UniversalChatParams {
    pub fn new(messages: Vec<UniversalMessage>) -> Self {
        Self { messages, ..Default::default() }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_generation(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn defaults_use_full_history_and_fallback_json_mode() {
        let params = UniversalChatParams::new(vec![UniversalMessage::user("hi")]);
        assert_eq!(params.library.history_mode, HistoryMode::Full);
        assert_eq!(params.messages[0].role, Role::User);
    }

    #[test]
    fn builder_methods_chain() {
        let params = UniversalChatParams::new(vec![])
            .with_generation(GenerationSettings { temperature: Some(0.7), ..Default::default() });
        assert_eq!(params.generation.temperature, Some(0.7));
    }
}
