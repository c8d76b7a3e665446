//! The `LanguageModel` and `Provider` traits: the seam every adapter crate
//! (e.g. `llmflow-openai-compatible`) implements and the only seam
//! `llmflow-core` calls through.
//!
//! Grounded on `ai-sdk-provider/src/language_model.rs`'s `LanguageModel`
//! trait (`do_generate`/`do_stream` over `LanguageModelCallOptions`),
//! renamed to the universal vocabulary (`chat_call`/`stream_call` over
//! `UniversalChatParams`) and split into a model-level trait plus a
//! provider-level factory, since `spec.md` §4.1's `ModelRegistry` needs to
//! enumerate a provider's models before any one of them is called.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ProviderError;
use crate::model::ModelInfo;
use crate::params::UniversalChatParams;
use crate::response::{UniversalChatResponse, UniversalStreamResponse};
use crate::stream_part::ProviderStreamChunk;

/// A boxed stream of raw provider chunks, as returned by
/// [`LanguageModel::stream_call`] before any pipeline stage processes it.
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<ProviderStreamChunk, ProviderError>> + Send>>;

/// One callable model exposed by a [`Provider`].
///
/// Implementors own the wire protocol (HTTP client, request/response
/// shapes, SSE framing) and are responsible only for translating between
/// that wire protocol and the universal envelope types in this crate — not
/// for retries, history management, or tool orchestration, which are
/// `llmflow-core`'s job.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Static information about this model: pricing, context window,
    /// declared capabilities.
    fn info(&self) -> &ModelInfo;

    /// Performs a complete (non-streamed) chat call.
    async fn chat_call(&self, params: UniversalChatParams) -> Result<UniversalChatResponse, ProviderError>;

    /// Performs a streamed chat call, returning a stream of raw chunks.
    async fn stream_call(&self, params: UniversalChatParams) -> Result<ProviderStream, ProviderError>;

    /// Generates one or more images from a text prompt. Adapters that
    /// don't support image generation return
    /// [`ProviderError::UnsupportedFunctionality`].
    async fn image_call(&self, _prompt: &str, _n: u32) -> Result<Vec<Vec<u8>>, ProviderError> {
        Err(ProviderError::unsupported("image_call", "this model does not support image generation"))
    }

    /// Computes embedding vectors for a batch of inputs. Adapters that
    /// don't support embeddings return
    /// [`ProviderError::UnsupportedFunctionality`].
    async fn embeddings_call(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Err(ProviderError::unsupported("embeddings_call", "this model does not support embeddings"))
    }
}

/// A vendor integration capable of producing [`LanguageModel`] handles for
/// one or more model names.
///
/// `llmflow-core`'s `ProviderManager` holds a `Provider` per configured
/// vendor and resolves `(provider_name, model_name)` pairs to a
/// `LanguageModel` through it.
pub trait Provider: Send + Sync {
    /// Short identifier used in model-registry lookups and tracing
    /// attributes, e.g. `"openai-compatible"`.
    fn name(&self) -> &str;

    /// Static info for every model this provider knows about, used to
    /// populate the `ModelRegistry` at startup.
    fn available_models(&self) -> Vec<ModelInfo>;

    /// Resolves a model name to a callable handle.
    fn model(&self, model_name: &str) -> Result<Box<dyn LanguageModel>, ProviderError>;
}

// Conversion between the universal envelope and a provider's own wire
// shapes (`convert_to_provider_params`, `convert_from_provider_response`,
// `convert_from_provider_stream_response`) is deliberately not a trait
// method here: the wire types are provider-specific, so each adapter
// exposes these as free functions instead (see
// `llmflow-openai-compatible::chat::{convert_params, convert_response,
// stream::convert_chunk}`). Contract for implementors:
//
// - every message in `params.messages` must appear in the converted
//   request in order; dropping one silently is never correct.
// - an unrecognized provider-native finish reason maps to
//   `FinishReason::Other`, never to a silent default of `Stop`.
// - usage fields absent from the provider's response are left at their
//   zero default rather than estimated.

#[allow(dead_code)]
fn assert_object_safe(_: &dyn LanguageModel) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Capabilities, Characteristics};

    struct EchoModel {
        info: ModelInfo,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn chat_call(&self, _params: UniversalChatParams) -> Result<UniversalChatResponse, ProviderError> {
            unimplemented!("not exercised in this test")
        }

        async fn stream_call(&self, _params: UniversalChatParams) -> Result<ProviderStream, ProviderError> {
            unimplemented!("not exercised in this test")
        }
    }

    fn sample_info() -> ModelInfo {
        ModelInfo {
            name: "echo".into(),
            input_price_per_million: 0.0,
            input_cached_price_per_million: None,
            output_price_per_million: 0.0,
            max_request_tokens: 1000,
            max_response_tokens: 1000,
            tokenization_model: None,
            capabilities: Capabilities::default(),
            characteristics: Characteristics { quality_index: 0, output_speed: 0.0, first_token_latency: 0.0 },
        }
    }

    #[tokio::test]
    async fn default_image_call_is_unsupported() {
        let model = EchoModel { info: sample_info() };
        let err = model.image_call("a cat", 1).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedFunctionality { .. }));
    }

    #[tokio::test]
    async fn default_embeddings_call_is_unsupported() {
        let model = EchoModel { info: sample_info() };
        let err = model.embeddings_call(&["hi".into()]).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedFunctionality { .. }));
    }
}
