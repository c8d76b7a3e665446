//! Tool schema fetch and rewrite: an MCP server's raw `tools/list` entries
//! become namespaced, sanitized tool names callers can register directly
//! as `llmflow_provider::tool::ToolDefinition`s, per `spec.md` §4.8.
//!
//! This module only handles the naming/schema transform; `adapter.rs`
//! wires the rewritten name back to a transport call when it builds the
//! actual `ToolDefinition::call_function`.

use serde_json::Value;

/// One `tools/list` entry as an MCP server returns it.
#[derive(Debug, Clone)]
pub struct McpToolDescriptor {
    pub original_name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A tool descriptor after namespacing, still missing the executable
/// callback only `adapter.rs` can supply.
#[derive(Debug, Clone)]
pub struct RewrittenToolSchema {
    pub namespaced_name: String,
    pub description: String,
    pub parameters: Value,
    pub metadata: Value,
}

/// Replaces every non-alphanumeric/non-underscore character with `_`,
/// matching the sanitization a JSON-Schema-conformant function name needs.
pub fn sanitize_tool_name(name: &str) -> String {
    name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect()
}

/// Composes the namespaced tool name a caller sees: `serverKey_toolName`,
/// both halves sanitized independently so a dotted server key doesn't
/// collide with an underscored one.
pub fn namespaced_tool_name(server_key: &str, tool_name: &str) -> String {
    format!("{}_{}", sanitize_tool_name(server_key), sanitize_tool_name(tool_name))
}

/// Converts one server's tool descriptors into namespaced schemas,
/// tagging each with `metadata.originalName` so `execute_tool` can
/// recover the server-side name.
pub fn rewrite_tool_schemas(server_key: &str, tools: &[McpToolDescriptor]) -> Vec<RewrittenToolSchema> {
    tools
        .iter()
        .map(|tool| {
            let namespaced = namespaced_tool_name(server_key, &tool.original_name);
            let mut metadata = serde_json::Map::new();
            metadata.insert("originalName".to_string(), Value::String(tool.original_name.clone()));
            metadata.insert("serverKey".to_string(), Value::String(server_key.to_string()));
            RewrittenToolSchema {
                namespaced_name: namespaced,
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
                metadata: Value::Object(metadata),
            }
        })
        .collect()
}

/// Strips quote/brace artifacts a model sometimes leaves around a
/// filesystem path argument, defaulting an empty path to the current
/// directory. Grounded on the sanitize-before-execute handling MCP
/// filesystem tools need since models occasionally wrap paths in stray
/// JSON punctuation when emitting inline tool calls.
pub fn sanitize_path_argument(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'' || c == '{' || c == '}' || c == '[' || c == ']');
    if trimmed.is_empty() { "./".to_string() } else { trimmed.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_and_sanitizes_tool_names() {
        assert_eq!(namespaced_tool_name("git.local", "read-file"), "git_local_read_file");
    }

    #[test]
    fn rewrite_tags_original_name_in_metadata() {
        let tools = vec![McpToolDescriptor { original_name: "read-file".into(), description: "reads a file".into(), input_schema: serde_json::json!({"type":"object"}) }];
        let rewritten = rewrite_tool_schemas("fs", &tools);
        assert_eq!(rewritten[0].namespaced_name, "fs_read_file");
        assert_eq!(rewritten[0].metadata["originalName"], "read-file");
    }

    #[test]
    fn sanitize_path_argument_strips_artifacts_and_defaults() {
        assert_eq!(sanitize_path_argument("\"./src\""), "./src");
        assert_eq!(sanitize_path_argument(""), "./");
        assert_eq!(sanitize_path_argument("  "), "./");
    }
}
