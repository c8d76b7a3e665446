//! Conversion between `llmflow_provider`'s universal envelope and this
//! adapter's OpenAI-compatible wire types. Kept as free functions per
//! `llmflow-provider/src/provider.rs`'s contract note rather than trait
//! methods, since the wire shapes are vendor-specific.

use llmflow_provider::message::{Content, ContentPart, Role, UniversalMessage};
use llmflow_provider::params::UniversalChatParams;
use llmflow_provider::response::{FinishReason, ResponseMetadata, UniversalChatResponse};
use llmflow_provider::tool::{ToolCall, ToolDefinition};
use llmflow_provider::usage::Usage;
use serde_json::{Value, json};

use super::api_types::{
    WireContentPart, WireFunctionCall, WireFunctionDefinition, WireImageUrl, WireMessage, WireResponse, WireToolCall,
    WireToolDefinition, WireUserContent,
};

/// Every message in `params.messages` appears in the returned body, in
/// order, per `llmflow-provider/src/provider.rs`'s conversion contract.
pub fn convert_to_provider_params(model_id: &str, params: &UniversalChatParams, stream: bool, include_usage: bool) -> Value {
    let messages: Vec<WireMessage> = params.messages.iter().map(convert_message).collect();
    let mut body = json!({
        "model": model_id,
        "messages": messages,
        "stream": stream,
    });

    if stream && include_usage {
        body["stream_options"] = json!({"include_usage": true});
    }

    let r#gen = &params.generation;
    if let Some(v) = r#gen.temperature {
        body["temperature"] = json!(v);
    }
    if let Some(v) = r#gen.top_p {
        body["top_p"] = json!(v);
    }
    if let Some(v) = r#gen.max_output_tokens {
        body["max_tokens"] = json!(v);
    }
    if let Some(v) = r#gen.presence_penalty {
        body["presence_penalty"] = json!(v);
    }
    if let Some(v) = r#gen.frequency_penalty {
        body["frequency_penalty"] = json!(v);
    }
    if !r#gen.stop_sequences.is_empty() {
        body["stop"] = json!(r#gen.stop_sequences);
    }
    if let Some(v) = r#gen.seed {
        body["seed"] = json!(v);
    }
    if let Some(schema) = &r#gen.response_schema {
        body["response_format"] = json!({"type": "json_schema", "json_schema": {"name": "response", "schema": schema}});
    }

    if !params.tools.is_empty() {
        body["tools"] = json!(params.tools.iter().map(convert_tool_definition).collect::<Vec<_>>());
    }

    body
}

fn convert_tool_definition(tool: &ToolDefinition) -> WireToolDefinition {
    WireToolDefinition {
        kind: "function",
        function: WireFunctionDefinition { name: tool.name.clone(), description: tool.description.clone(), parameters: tool.parameters.clone() },
    }
}

fn convert_message(message: &UniversalMessage) -> WireMessage {
    match message.role {
        Role::System => WireMessage::System { content: message.content.as_text() },
        Role::User => WireMessage::User { content: convert_user_content(&message.content) },
        Role::Assistant => WireMessage::Assistant {
            content: if message.content.is_empty() { None } else { Some(message.content.as_text()) },
            tool_calls: message.tool_calls.as_ref().map(|calls| calls.iter().map(convert_tool_call_to_wire).collect()),
        },
        Role::Tool | Role::Function => WireMessage::Tool {
            content: message.content.as_text(),
            tool_call_id: message.tool_call_id.clone().unwrap_or_default(),
        },
    }
}

fn convert_user_content(content: &Content) -> WireUserContent {
    match content {
        Content::Text(text) => WireUserContent::Text(text.clone()),
        Content::Parts(parts) => WireUserContent::Parts(
            parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text(text) => Some(WireContentPart::Text { text: text.clone() }),
                    ContentPart::Image(image) => image.url.clone().map(|url| WireContentPart::ImageUrl { image_url: WireImageUrl { url } }),
                    ContentPart::File(_) => None,
                })
                .collect(),
        ),
    }
}

fn convert_tool_call_to_wire(call: &ToolCall) -> WireToolCall {
    WireToolCall {
        tool_type: "function".to_string(),
        id: call.id.clone().unwrap_or_default(),
        function: WireFunctionCall { name: call.name.clone(), arguments: call.arguments.to_string() },
    }
}

/// Maps a raw OpenAI-compatible `finish_reason` string to the universal
/// [`FinishReason`]. An unrecognized reason maps to `Other`, never
/// silently to `Stop`.
pub fn map_finish_reason(raw: Option<&str>) -> FinishReason {
    match raw {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        Some("function_call") | Some("tool_calls") => FinishReason::ToolCalls,
        Some(_) => FinishReason::Other,
        None => FinishReason::Other,
    }
}

fn convert_usage(usage: &Option<super::api_types::WireUsage>) -> Usage {
    match usage {
        Some(usage) => usage_from_wire(usage),
        None => Usage::default(),
    }
}

/// Converts one wire usage block, used both by the non-streamed response
/// path and by the streamed `Usage` chunk.
pub fn usage_from_wire(usage: &super::api_types::WireUsage) -> Usage {
    let mut out = Usage::default();
    out.tokens.input.total = usage.prompt_tokens.unwrap_or(0);
    out.tokens.input.cached = usage.prompt_tokens_details.as_ref().and_then(|d| d.cached_tokens).unwrap_or(0);
    out.tokens.output.total = usage.completion_tokens.unwrap_or(0);
    out.tokens.output.reasoning = usage.completion_tokens_details.as_ref().and_then(|d| d.reasoning_tokens);
    out.tokens.total = out.tokens.input.total + out.tokens.output.total;
    out
}

/// Converts a complete, non-streamed response body into the universal
/// envelope.
pub fn convert_from_provider_response(provider_name: &str, model_name: &str, body: WireResponse) -> Result<UniversalChatResponse, String> {
    let choice = body.choices.into_iter().next().ok_or("response carried no choices")?;
    let usage = convert_usage(&body.usage);

    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: Some(call.id),
            name: call.function.name,
            arguments: serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null),
        })
        .collect();

    Ok(UniversalChatResponse {
        content: Content::Text(choice.message.content.unwrap_or_default()),
        tool_calls,
        finish_reason: map_finish_reason(choice.finish_reason.as_deref()),
        usage,
        metadata: ResponseMetadata { provider_name: Some(provider_name.to_string()), model_name: Some(model_name.to_string()), ..Default::default() },
        raw: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmflow_provider::message::UniversalMessage;

    #[test]
    fn converts_system_and_user_messages_in_order() {
        let params = UniversalChatParams::new(vec![UniversalMessage::system("be terse"), UniversalMessage::user("hi")]);
        let body = convert_to_provider_params("gpt-4o-mini", &params, false, false);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
    }

    #[test]
    fn unrecognized_finish_reason_maps_to_other_not_stop() {
        assert_eq!(map_finish_reason(Some("safety")), FinishReason::Other);
        assert_eq!(map_finish_reason(None), FinishReason::Other);
    }

    #[test]
    fn tool_definitions_become_function_type_entries() {
        let tool = ToolDefinition {
            name: "get_time".into(),
            description: "gets the time".into(),
            parameters: json!({"type": "object"}),
            call_function: std::sync::Arc::new(|_| Box::pin(async { Ok(Value::Null) })),
            origin: None,
            metadata: None,
        };
        let params = UniversalChatParams::new(vec![UniversalMessage::user("hi")]).with_tools(vec![tool]);
        let body = convert_to_provider_params("gpt-4o-mini", &params, false, false);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "get_time");
    }
}
