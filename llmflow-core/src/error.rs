//! `CoreError`, the taxonomy `llmflow-core`'s own components raise —
//! distinct from [`llmflow_provider::error::ProviderError`], which is an
//! adapter's error and arrives wrapped in `CoreError::Provider`.
//!
//! Grounded on the teacher's `AISDKError` (`src/error.rs` before this
//! crate's domain moved from text-generation builders to orchestration):
//! a flat `thiserror` enum with an `impl` constructor per variant, plus
//! `src/error/retryable_error.rs`'s builder for the one variant
//! (`Retryable`) that carries an optional `retry_after` hint.

use std::time::Duration;

use thiserror::Error;

use llmflow_provider::error::ProviderError;

#[derive(Debug, Error)]
pub enum CoreError {
    /// `ModelSelector` could not find a model satisfying the given
    /// requirements under the given alias.
    #[error("no model satisfies the given requirements for alias '{alias}'")]
    NoCapableModel { alias: String },

    /// `ModelRegistry` has no entry under this name.
    #[error("no such model: '{model_name}'")]
    NoSuchModel { model_name: String },

    /// `ProviderManager` has no provider registered under this name.
    #[error("no such provider: '{provider_name}'")]
    NoSuchProvider { provider_name: String },

    /// `ChunkController` exceeded its configured iteration ceiling.
    #[error("chunk iteration limit reached: {limit} prompts processed without completion")]
    ChunkIterationLimit { limit: u32 },

    /// `ToolController`/`ToolOrchestrator` exceeded its configured
    /// iteration ceiling.
    #[error("tool iteration limit reached: {limit} rounds without a final answer")]
    ToolIterationLimit { limit: u32 },

    /// A tool name referenced in a parsed call is not registered.
    #[error("no such tool: '{tool_name}'. available tools: {available:?}")]
    NoSuchTool { tool_name: String, available: Vec<String> },

    /// A tool call's arguments failed schema validation.
    #[error("invalid input for tool '{tool_name}': {message}")]
    InvalidToolInput { tool_name: String, message: String },

    /// A caller-supplied argument was invalid.
    #[error("invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    /// The assembled prompt could not be processed (e.g. empty message
    /// list reaching `RequestProcessor`).
    #[error("invalid prompt: {message}")]
    InvalidPrompt { message: String },

    /// `ResponseProcessor::validate_json_mode` rejected the call because
    /// `jsonMode` was `native-only` and the model has no native
    /// structured-output capability.
    #[error("model '{model_name}' has no native JSON mode and jsonMode is native-only")]
    NativeJsonModeUnsupported { model_name: String },

    /// Schema validation failed after parsing (and possibly repairing)
    /// the model's JSON output.
    #[error("schema validation failed: {errors:?}")]
    SchemaValidation { errors: Vec<SchemaValidationError> },

    /// An MCP tool call or transport operation timed out.
    #[error("MCP operation timed out after {0:?}")]
    McpTimeout(Duration),

    /// An MCP JSON-RPC call returned a protocol-level error.
    #[error("MCP error ({code}): {message}")]
    Mcp { code: i64, message: String },

    /// `RetryManager` exhausted its attempt budget.
    #[error("retry attempts exhausted after {attempts} tries: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// The caller's cancellation token fired mid-operation.
    #[error("operation cancelled")]
    Cancelled,

    /// A generic retryable failure not otherwise classified, carrying an
    /// optional provider-supplied delay hint.
    #[error("retryable error: {message}")]
    Retryable { message: String, retry_after: Option<Duration> },

    /// An error surfaced by a provider adapter.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// One schema-validation failure, as attached to
/// `UniversalChatResponse::metadata.validation_errors`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidationError {
    pub path: String,
    pub message: String,
}

impl CoreError {
    pub fn no_capable_model(alias: impl Into<String>) -> Self {
        Self::NoCapableModel { alias: alias.into() }
    }

    pub fn no_such_tool(tool_name: impl Into<String>, available: Vec<String>) -> Self {
        Self::NoSuchTool { tool_name: tool_name.into(), available }
    }

    pub fn invalid_tool_input(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidToolInput { tool_name: tool_name.into(), message: message.into() }
    }

    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument { argument: argument.into(), message: message.into() }
    }

    /// Whether `RetryManager` should consider this error class retryable
    /// independent of the caller-supplied `should_retry` predicate; used
    /// as the baseline that predicate can widen but not narrow below.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::Retryable { .. } => true,
            Self::McpTimeout(_) => true,
            _ => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Retryable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Fluent constructor for [`CoreError::Retryable`], mirroring the
/// teacher's `RetryableErrorBuilder`.
#[derive(Debug, Clone)]
pub struct RetryableErrorBuilder {
    message: String,
    retry_after: Option<Duration>,
}

impl RetryableErrorBuilder {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), retry_after: None }
    }

    pub fn retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn build(self) -> CoreError {
        CoreError::Retryable { message: self.message, retry_after: self.retry_after }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_builder_carries_retry_after() {
        let err = RetryableErrorBuilder::new("rate limited").retry_after(Duration::from_secs(5)).build();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn provider_errors_inherit_retryability() {
        let provider_err = ProviderError::ApiCall {
            message: "boom".into(),
            url: "https://x".into(),
            status_code: Some(500),
            response_headers: None,
            response_body: None,
            is_retryable: true,
            source: None,
        };
        let core_err: CoreError = provider_err.into();
        assert!(core_err.is_retryable());
    }

    #[test]
    fn non_retryable_variants_report_false() {
        assert!(!CoreError::no_capable_model("cheap").is_retryable());
    }
}
