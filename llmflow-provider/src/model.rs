//! `ModelInfo` and its capability/characteristic sub-shapes.
//!
//! Grounded on `ai-sdk-provider/src/language_model.rs`'s model-identity
//! accessors (`provider()`, `model_id()`, `supported_urls()`), generalized
//! into a registry-friendly data struct since `spec.md` §4.2's
//! `ModelSelector` needs to filter/rank over plain data rather than trait
//! objects.

use serde::{Deserialize, Serialize};

/// Whether a model supports tool calls, and if so how it streams them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolCallStreamingMode {
    None,
    OnComplete,
    Deltas,
}

/// Tool-call support: either entirely absent, or present with a streaming mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallSupport {
    pub supported: bool,
    pub streaming_mode: ToolCallStreamingMode,
}

impl ToolCallSupport {
    pub const fn none() -> Self {
        Self { supported: false, streaming_mode: ToolCallStreamingMode::None }
    }

    pub const fn deltas() -> Self {
        Self { supported: true, streaming_mode: ToolCallStreamingMode::Deltas }
    }

    pub const fn on_complete() -> Self {
        Self { supported: true, streaming_mode: ToolCallStreamingMode::OnComplete }
    }
}

/// Input-side modality support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSupport {
    pub text: bool,
    pub image: bool,
}

/// Text output format support (`'text'`, `'json'`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOutputSupport {
    pub formats: Vec<String>,
}

impl TextOutputSupport {
    pub fn supports(&self, format: &str) -> bool {
        self.formats.iter().any(|f| f == format)
    }
}

/// Image-generation operation support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOutputSupport {
    pub generate: bool,
    pub edit: bool,
    pub edit_with_mask: bool,
}

/// Output-side modality support.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSupport {
    pub text: Option<TextOutputSupport>,
    pub image: Option<ImageOutputSupport>,
    pub embeddings: Option<EmbeddingSupport>,
}

/// Supported embedding vector dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSupport {
    pub dimensions: Vec<u32>,
}

/// `ModelInfo.capabilities`, the declarative predicate surface
/// [`crate::model`]'s consumer (`ModelSelector`) filters and ranks against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub streaming: bool,
    pub tool_calls: ToolCallSupportOrBool,
    pub parallel_tool_calls: bool,
    pub reasoning: bool,
    pub input: InputSupport,
    pub output: OutputSupport,
}

/// `capabilities.toolCalls` is `bool | {streamingMode}` per `spec.md` §3;
/// this enum makes both forms constructible while `ToolCallSupport`
/// remains the canonical "supported" accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolCallSupportOrBool {
    Bool(bool),
    Detailed(ToolCallSupport),
}

impl Default for ToolCallSupportOrBool {
    fn default() -> Self {
        Self::Bool(false)
    }
}

impl ToolCallSupportOrBool {
    pub fn supported(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Detailed(d) => d.supported,
        }
    }

    pub fn streaming_mode(&self) -> ToolCallStreamingMode {
        match self {
            Self::Bool(true) => ToolCallStreamingMode::OnComplete,
            Self::Bool(false) => ToolCallStreamingMode::None,
            Self::Detailed(d) => d.streaming_mode,
        }
    }
}

/// `ModelInfo.characteristics`: the ranking inputs `ModelSelector`'s alias
/// scoring reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristics {
    /// 0–100.
    pub quality_index: u8,
    /// tokens/sec.
    pub output_speed: f64,
    /// ms.
    pub first_token_latency: f64,
}

/// All static information the registry and selector need about one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub input_price_per_million: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_cached_price_per_million: Option<f64>,
    pub output_price_per_million: f64,
    pub max_request_tokens: u64,
    pub max_response_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenization_model: Option<String>,
    pub capabilities: Capabilities,
    pub characteristics: Characteristics,
}

impl ModelInfo {
    /// Effective cached input price, falling back to the non-cached price
    /// per `SPEC_FULL.md` §4.13.
    pub fn effective_cached_input_price(&self) -> f64 {
        self.input_cached_price_per_million.unwrap_or(self.input_price_per_million)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_support_bool_true_means_on_complete_streaming() {
        let s = ToolCallSupportOrBool::Bool(true);
        assert!(s.supported());
        assert_eq!(s.streaming_mode(), ToolCallStreamingMode::OnComplete);
    }

    #[test]
    fn text_output_support_checks_membership() {
        let t = TextOutputSupport { formats: vec!["text".into(), "json".into()] };
        assert!(t.supports("json"));
        assert!(!t.supports("markdown"));
    }

    #[test]
    fn effective_cached_price_falls_back() {
        let info = sample_model("m", None);
        assert_eq!(info.effective_cached_input_price(), info.input_price_per_million);
    }

    fn sample_model(name: &str, cached: Option<f64>) -> ModelInfo {
        ModelInfo {
            name: name.into(),
            input_price_per_million: 1.0,
            input_cached_price_per_million: cached,
            output_price_per_million: 2.0,
            max_request_tokens: 128_000,
            max_response_tokens: 4096,
            tokenization_model: None,
            capabilities: Capabilities::default(),
            characteristics: Characteristics { quality_index: 50, output_speed: 50.0, first_token_latency: 1000.0 },
        }
    }
}
