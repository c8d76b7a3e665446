//! `ProviderError`, the taxonomy of errors a [`crate::provider::Provider`]
//! adapter raises.
//!
//! Grounded on `ai-sdk-provider/src/error.rs` and its per-variant builder
//! pattern (`error/api_call.rs`'s `APICallErrorBuilder`), trimmed to the
//! variants that still apply once embeddings/image calls are adapter-local
//! concerns rather than first-class provider operations, and with
//! `is_retryable()` promoted so `llmflow-core`'s `RetryManager` can use it
//! without matching on variants itself.

use std::collections::HashMap;

use thiserror::Error;

/// Errors a provider adapter can raise while preparing, sending, or
/// interpreting a call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested model name is not registered with this provider.
    #[error("no such model: {model_name} (provider: {provider_name})")]
    NoSuchModel { model_name: String, provider_name: String },

    /// The HTTP call itself failed or returned a non-success status.
    #[error("API call failed: {message}")]
    ApiCall {
        message: String,
        url: String,
        status_code: Option<u16>,
        response_headers: Option<HashMap<String, String>>,
        response_body: Option<String>,
        is_retryable: bool,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The response body was empty where content was expected.
    #[error("empty response body: {message}")]
    EmptyResponseBody { message: String },

    /// A call argument was invalid.
    #[error("invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    /// The assembled prompt was rejected by the provider before any
    /// network call was attempted (e.g. empty message list).
    #[error("invalid prompt: {message}")]
    InvalidPrompt { message: String },

    /// The response body could not be parsed into the shape the adapter
    /// expected.
    #[error("invalid response data: {message}")]
    InvalidResponseData { message: String, data: String },

    /// A requested feature (streaming, tool calls, a given modality) is
    /// not supported by this provider or model.
    #[error("unsupported functionality '{functionality}': {message}")]
    UnsupportedFunctionality { functionality: String, message: String },

    /// Loading an API key from the environment or configuration failed.
    #[error("failed to load API key: {message}")]
    LoadApiKey { message: String },

    /// The provider reported a mid-stream error after already starting to
    /// emit chunks.
    #[error("provider stream error: {message}")]
    StreamError { message: String },
}

impl ProviderError {
    pub fn no_such_model(model_name: impl Into<String>, provider_name: impl Into<String>) -> Self {
        Self::NoSuchModel { model_name: model_name.into(), provider_name: provider_name.into() }
    }

    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument { argument: argument.into(), message: message.into() }
    }

    pub fn unsupported(functionality: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedFunctionality { functionality: functionality.into(), message: message.into() }
    }

    /// Whether a `RetryManager` should attempt this call again.
    ///
    /// Only `ApiCall` errors carry retry information; every other variant
    /// reflects a request that will fail identically on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ApiCall { is_retryable: true, .. }) || matches!(self, Self::StreamError { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiCall { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Fluent constructor for [`ProviderError::ApiCall`], mirroring the
/// teacher's per-variant builder since this variant alone carries enough
/// optional fields to make positional construction unreadable.
#[derive(Debug, Default)]
pub struct ApiCallErrorBuilder {
    message: String,
    url: String,
    status_code: Option<u16>,
    response_headers: Option<HashMap<String, String>>,
    response_body: Option<String>,
    is_retryable: Option<bool>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ApiCallErrorBuilder {
    pub fn new(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self { message: message.into(), url: url.into(), ..Default::default() }
    }

    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn response_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.response_headers = Some(headers);
        self
    }

    pub fn response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(body.into());
        self
    }

    pub fn is_retryable(mut self, retryable: bool) -> Self {
        self.is_retryable = Some(retryable);
        self
    }

    pub fn source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn build(self) -> ProviderError {
        let is_retryable = self.is_retryable.unwrap_or_else(|| {
            self.status_code
                .is_some_and(|code| code == 408 || code == 409 || code == 429 || code >= 500)
        });
        ProviderError::ApiCall {
            message: self.message,
            url: self.url,
            status_code: self.status_code,
            response_headers: self.response_headers,
            response_body: self.response_body,
            is_retryable,
            source: self.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_auto_determines_retryability_from_status() {
        let err = ApiCallErrorBuilder::new("rate limited", "https://api.example.com").status_code(429).build();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), Some(429));
    }

    #[test]
    fn builder_respects_explicit_override() {
        let err = ApiCallErrorBuilder::new("bad gateway", "https://api.example.com")
            .status_code(502)
            .is_retryable(false)
            .build();
        assert!(!err.is_retryable());
    }

    #[test]
    fn non_api_call_variants_are_never_retryable() {
        assert!(!ProviderError::no_such_model("gpt-5", "openai").is_retryable());
        assert!(!ProviderError::invalid_argument("model", "empty").is_retryable());
    }
}
