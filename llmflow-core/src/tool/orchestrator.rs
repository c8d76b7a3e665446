//! `ToolOrchestrator`: the multi-turn tool-calling loop — parse calls,
//! execute them, feed results back into history, re-call the model —
//! until an answer with no further calls or an iteration ceiling.
//!
//! No teacher equivalent (the teacher's agent loop has no comparable
//! HistoryManager/ToolController split); built from `spec.md` §4.7's
//! pseudocode verbatim, wired onto [`ToolsManager`]/[`HistoryManager`]
//! and an injected chat-execution closure (same inversion
//! [`crate::chunk_controller`] uses) rather than a concrete
//! `ChatController` type.

use llmflow_provider::message::{Role, UniversalMessage};
use llmflow_provider::response::UniversalChatResponse;

use crate::error::CoreError;
use crate::history::HistoryManager;
use crate::tool::controller::{self, DEFAULT_MAX_ITERATIONS};
use crate::tool::manager::ToolsManager;

/// Runs the multi-turn tool loop starting from `initial_response`,
/// feeding each round's tool results back into `history` and calling
/// `execute_chat` again until the model answers without further tool
/// calls or `max_iterations` parse passes have run.
pub async fn run<F, Fut>(
    manager: &ToolsManager,
    history: &mut HistoryManager,
    max_history_len: usize,
    max_iterations: u32,
    initial_response: UniversalChatResponse,
    mut execute_chat: F,
) -> Result<UniversalChatResponse, CoreError>
where
    F: FnMut(&HistoryManager) -> Fut,
    Fut: std::future::Future<Output = Result<UniversalChatResponse, CoreError>>,
{
    let mut response = initial_response;
    let mut pass_index = 0u32;

    loop {
        let calls = controller::parse_tool_calls(&response);
        if calls.is_empty() {
            return Ok(response);
        }

        if pass_index >= max_iterations {
            return Err(CoreError::ToolIterationLimit { limit: max_iterations });
        }

        if let llmflow_provider::message::Content::Text(text) = &response.content {
            let visible = controller::strip_inline_markers(text);
            if !visible.is_empty() {
                history.add_message(UniversalMessage::assistant(visible));
            }
        }

        for call in &calls {
            let result = controller::process_tool_call(manager, call).await;
            let content = match &result.outcome {
                Ok(value) => value.to_string(),
                Err(message) => message.clone(),
            };
            history.add_message(UniversalMessage::tool_result(
                result.tool_call_id.clone().unwrap_or_default(),
                result.name.clone(),
                content,
            ));
        }

        history.trim_to_most_recent(max_history_len);
        pass_index += 1;

        response = execute_chat(history).await?;
    }
}

/// Placeholder kept for symmetry with [`crate::chunk_controller`]'s
/// exported default; tool iteration ceilings default through
/// [`DEFAULT_MAX_ITERATIONS`] re-exported from `controller`.
pub const _DEFAULT_TOOL_ITERATIONS: u32 = DEFAULT_MAX_ITERATIONS;

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::message::Content;
    use llmflow_provider::response::{FinishReason, ResponseMetadata};
    use llmflow_provider::tool::{ToolCall, ToolDefinition};
    use llmflow_provider::usage::Usage;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn response_with_call(name: &str) -> UniversalChatResponse {
        UniversalChatResponse {
            content: Content::Text(String::new()),
            tool_calls: vec![ToolCall { id: Some("1".into()), name: name.into(), arguments: serde_json::json!({}) }],
            finish_reason: FinishReason::ToolCalls,
            usage: Usage::default(),
            metadata: ResponseMetadata::default(),
            raw: None,
        }
    }

    fn final_response(text: &str) -> UniversalChatResponse {
        UniversalChatResponse {
            content: Content::Text(text.into()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            metadata: ResponseMetadata::default(),
            raw: None,
        }
    }

    fn echo_tool() -> ToolDefinition {
        ToolDefinition {
            name: "echo".into(),
            description: "".into(),
            parameters: serde_json::json!({"type": "object"}),
            call_function: Arc::new(|args| Box::pin(async move { Ok(args) })),
            origin: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn returns_immediately_when_no_tool_calls() {
        let manager = ToolsManager::new();
        let mut history = HistoryManager::new(crate::history::HistoryMode::Full);
        let result = run(&manager, &mut history, 50, 10, final_response("done"), |_h| async { unreachable!() }).await;
        assert_eq!(result.unwrap().content.as_text(), "done");
    }

    #[tokio::test]
    async fn loops_until_model_stops_calling_tools() {
        let mut manager = ToolsManager::new();
        manager.register(echo_tool());
        let mut history = HistoryManager::new(crate::history::HistoryMode::Full);
        let calls = AtomicU32::new(0);
        let result = run(&manager, &mut history, 50, 10, response_with_call("echo"), |_h| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n == 0 { Ok(final_response("all done")) } else { Ok(final_response("should not loop again")) } }
        })
        .await;
        assert_eq!(result.unwrap().content.as_text(), "all done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn iteration_limit_stops_an_infinite_loop() {
        let mut manager = ToolsManager::new();
        manager.register(echo_tool());
        let mut history = HistoryManager::new(crate::history::HistoryMode::Full);
        let result = run(&manager, &mut history, 50, 2, response_with_call("echo"), |_h| async { Ok(response_with_call("echo")) }).await;
        assert!(matches!(result, Err(CoreError::ToolIterationLimit { limit: 2 })));
    }
}
