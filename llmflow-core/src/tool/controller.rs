//! `ToolController`: parses both tool-call surfaces — native structured
//! `tool_calls` and inline `<tool>NAME:JSON_ARGS</tool>` text markers —
//! then validates and executes each against [`ToolsManager`].
//!
//! Grounded on the teacher's former `tool/parse_tool_call.rs`
//! (`validate_tool_input` via `jsonschema`) for the argument-coercion
//! step, generalized per `spec.md` §4.7 to also recognize the inline
//! marker surface the teacher never needed (its tool calls always arrive
//! as native structured output).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use llmflow_provider::message::Content;
use llmflow_provider::response::UniversalChatResponse;
use llmflow_provider::tool::ToolCall;

use crate::error::CoreError;
use crate::schema;
use crate::tool::manager::ToolsManager;

/// Default ceiling on tool-call parse passes before `tool-iteration-limit`
/// fires, per `spec.md` §4.7.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

static INLINE_TOOL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tool>([A-Za-z0-9_]+):(\{.*?\})</tool>").expect("inline tool marker regex is valid"));

/// The outcome of executing one parsed tool call.
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    pub tool_call_id: Option<String>,
    pub name: String,
    pub parameters: Value,
    pub outcome: Result<Value, String>,
}

/// Parses every tool call out of `response`'s native `tool_calls` field
/// and any inline `<tool>NAME:JSON</tool>` markers in its text content.
pub fn parse_tool_calls(response: &UniversalChatResponse) -> Vec<ToolCall> {
    let mut calls = response.tool_calls.clone();

    if let Content::Text(text) = &response.content {
        for captures in INLINE_TOOL_MARKER.captures_iter(text) {
            let name = captures[1].to_string();
            if let Ok(arguments) = serde_json::from_str::<Value>(&captures[2]) {
                calls.push(ToolCall { id: None, name, arguments });
            }
        }
    }

    calls
}

/// Strips every inline tool marker out of `text`, leaving any
/// user-visible prose the model wrote alongside the call.
pub fn strip_inline_markers(text: &str) -> String {
    INLINE_TOOL_MARKER.replace_all(text, "").trim().to_string()
}

/// Validates `call.arguments` against `tool`'s parameter schema, then
/// executes it via `manager`, yielding a structured success/error result
/// rather than propagating failures — tool execution errors become
/// `{toolCallId, name, parameters, error}` results the caller can still
/// feed back to the model.
pub async fn process_tool_call(manager: &ToolsManager, call: &ToolCall) -> ToolExecutionResult {
    let Some(tool) = manager.get(&call.name) else {
        return ToolExecutionResult {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            parameters: call.arguments.clone(),
            outcome: Err(format!("no such tool: '{}'", call.name)),
        };
    };

    if let Err(errors) = schema::validate(&tool.parameters, &call.arguments) {
        let message = errors.into_iter().map(|e| e.message).collect::<Vec<_>>().join("; ");
        return ToolExecutionResult {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            parameters: call.arguments.clone(),
            outcome: Err(message),
        };
    }

    let outcome = manager.execute(&call.name, call.arguments.clone()).await.map_err(|e| e.to_string());
    ToolExecutionResult { tool_call_id: call.id.clone(), name: call.name.clone(), parameters: call.arguments.clone(), outcome }
}

/// Parses and executes every tool call in `response`, failing with
/// [`CoreError::ToolIterationLimit`] if this is parse pass number
/// `pass_index` (0-based) and it has reached `max_iterations`.
pub async fn process_tool_calls(
    manager: &ToolsManager,
    response: &UniversalChatResponse,
    pass_index: u32,
    max_iterations: u32,
) -> Result<Vec<ToolExecutionResult>, CoreError> {
    if pass_index >= max_iterations {
        return Err(CoreError::ToolIterationLimit { limit: max_iterations });
    }

    let calls = parse_tool_calls(response);
    let mut results = Vec::with_capacity(calls.len());
    for call in &calls {
        results.push(process_tool_call(manager, call).await);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::response::{FinishReason, ResponseMetadata};
    use llmflow_provider::usage::Usage;
    use std::sync::Arc;

    fn response_with_text(text: &str) -> UniversalChatResponse {
        UniversalChatResponse {
            content: Content::Text(text.into()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            metadata: ResponseMetadata::default(),
            raw: None,
        }
    }

    #[test]
    fn parses_inline_marker_call() {
        let response = response_with_text("before <tool>get_weather:{\"city\":\"paris\"}</tool> after");
        let calls = parse_tool_calls(&response);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].arguments, serde_json::json!({"city": "paris"}));
    }

    #[test]
    fn strip_inline_markers_removes_the_marker_text() {
        let stripped = strip_inline_markers("see result: <tool>f:{}</tool>");
        assert_eq!(stripped, "see result:");
    }

    #[test]
    fn native_tool_calls_pass_through_unchanged() {
        let mut response = response_with_text("");
        response.tool_calls = vec![ToolCall { id: Some("1".into()), name: "f".into(), arguments: serde_json::json!({}) }];
        let calls = parse_tool_calls(&response);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "f");
    }

    fn tool_with_schema() -> llmflow_provider::tool::ToolDefinition {
        llmflow_provider::tool::ToolDefinition {
            name: "get_weather".into(),
            description: "".into(),
            parameters: serde_json::json!({"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]}),
            call_function: Arc::new(|args| Box::pin(async move { Ok(args) })),
            origin: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn invalid_arguments_yield_an_error_result_not_a_failure() {
        let mut manager = ToolsManager::new();
        manager.register(tool_with_schema());
        let call = ToolCall { id: Some("1".into()), name: "get_weather".into(), arguments: serde_json::json!({}) };
        let result = process_tool_call(&manager, &call).await;
        assert!(result.outcome.is_err());
    }

    #[tokio::test]
    async fn valid_arguments_execute_successfully() {
        let mut manager = ToolsManager::new();
        manager.register(tool_with_schema());
        let call = ToolCall { id: Some("1".into()), name: "get_weather".into(), arguments: serde_json::json!({"city": "paris"}) };
        let result = process_tool_call(&manager, &call).await;
        assert_eq!(result.outcome.unwrap(), serde_json::json!({"city": "paris"}));
    }

    #[tokio::test]
    async fn iteration_limit_is_enforced() {
        let manager = ToolsManager::new();
        let response = response_with_text("");
        let result = process_tool_calls(&manager, &response, 10, DEFAULT_MAX_ITERATIONS).await;
        assert!(matches!(result, Err(CoreError::ToolIterationLimit { .. })));
    }
}
