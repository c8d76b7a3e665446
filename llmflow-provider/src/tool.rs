//! Tool definition and tool-call types.
//!
//! Grounded on `ai-sdk-provider/src/language_model/tool.rs` and
//! `.../content/tool_call.rs` for the call/definition split, reshaped to the
//! flatter `{name, arguments}` envelope `spec.md` §3 names (the teacher
//! distinguishes typed/dynamic tools; the universal envelope here does not
//! need that distinction since schema validation is the core's job, not the
//! provider's).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model may call, as registered with `ToolsManager`.
///
/// # Invariant
///
/// `name` matches `[A-Za-z0-9_]+`; MCP-sourced tools rewrite dots in their
/// remote name to underscores before they ever reach this type (see
/// `llmflow-mcp`'s tool-schema conversion).
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub call_function: Arc<dyn Fn(Value) -> ToolCallFuture + Send + Sync>,
    pub origin: Option<ToolOrigin>,
    pub metadata: Option<Value>,
}

/// Where a [`ToolDefinition`] came from: a locally registered callable, or a
/// remote MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOrigin {
    Local,
    Mcp { server_key: String, original_name: String },
}

pub type ToolCallFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Value, String>> + Send>>;

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Validates the `name` invariant documented on [`ToolDefinition`].
pub fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A model-requested invocation of a tool, either parsed from a native
/// structured `toolCalls` field or from an inline `<tool>NAME:ARGS</tool>`
/// marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
}

/// One incremental delta of a tool call's arguments being streamed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments_chunk: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_accept_letters_digits_underscore() {
        assert!(is_valid_tool_name("get_weather"));
        assert!(is_valid_tool_name("getWeather2"));
    }

    #[test]
    fn invalid_names_reject_dots_and_empty() {
        assert!(!is_valid_tool_name("filesystem.list_directory"));
        assert!(!is_valid_tool_name(""));
        assert!(!is_valid_tool_name("get-weather"));
    }
}
