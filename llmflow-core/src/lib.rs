//! Orchestration engine sitting above [`llmflow_provider`]'s adapter
//! contract: model selection and registries, request chunking, chat and
//! stream controllers, tool lifecycle, schema validation/repair, retry
//! policy, history management, and usage/tracing.
//!
//! # Module Organization
//!
//! - [`error`]: the `CoreError` taxonomy raised by this crate's own
//!   components, distinct from an adapter's `ProviderError`.
//! - [`registry`]: `ModelRegistry`, a per-provider model table.
//! - [`selector`]: `ModelSelector`, alias-based model selection.
//! - [`token`]: `TokenCalculator`, pluggable token counting with a
//!   heuristic fallback.

pub mod caller;
pub mod chat;
pub mod chunk_controller;
pub mod error;
pub mod history;
pub mod otel;
pub mod provider_manager;
pub mod registry;
pub mod response;
pub mod retry;
pub mod schema;
pub mod selector;
pub mod splitter;
pub mod stream;
pub mod token;
pub mod tool;
pub mod usage_tracker;

pub use caller::{LLMCaller, LLMCallerOptions};
pub use chat::{ChatConfig, ChatContentRetryPolicy};
pub use chunk_controller::{process_chunks, stream_chunks, DEFAULT_MAX_ITERATIONS};
pub use error::{CoreError, SchemaValidationError};
pub use history::{HistoryManager, HistoryMode};
pub use otel::{OtelService, RedactionPolicy};
pub use provider_manager::ProviderManager;
pub use registry::ModelRegistry;
pub use response::{validate_json_mode, validate_response, JsonModeDecision, ValidatedContent};
pub use retry::{default_should_retry, execute_with_retry, RetryConfig};
pub use selector::{select_model, ModelAlias, ModelRequirements};
pub use splitter::{split_if_needed, DataChunk, SplitRequest, SplittableData};
pub use stream::{create_stream, BufferedOutput, ContentRetryPolicy, StreamBuffer, StreamConfig};
pub use token::{HeuristicCounter, TokenCalculator, TokenCounter};
pub use tool::{run_tool_loop, ToolExecutionResult, ToolsManager};
pub use usage_tracker::{UsageCallback, UsageTracker};
