//! `McpServiceAdapter`: the single entry point `llmflow-core`'s caller
//! façade uses to connect MCP servers, list/execute their tools, and pass
//! through resources/prompts, per `spec.md` §4.8.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::RwLock;
use tokio::time::sleep;

use crate::config::{HttpMode, McpServerConfig, TransportKind};
use crate::error::McpError;
use crate::oauth::OAuthRegistry;
use crate::tools::{McpToolDescriptor, RewrittenToolSchema, rewrite_tool_schemas};
use crate::transport::{HttpTransport, StdioTransport, Transport};

const DEFAULT_EXECUTE_RETRIES: u32 = 2;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

struct ConnectedServer {
    transport: Arc<dyn Transport>,
    config: McpServerConfig,
}

/// Connects to, and proxies calls against, every MCP server a caller has
/// configured. One adapter instance is shared for the lifetime of a
/// `LLMCaller` so tool schema caches survive across calls.
pub struct McpServiceAdapter {
    servers: RwLock<HashMap<String, ConnectedServer>>,
    tool_cache: RwLock<HashMap<String, Vec<RewrittenToolSchema>>>,
    oauth: OAuthRegistry,
}

impl Default for McpServiceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl McpServiceAdapter {
    pub fn new() -> Self {
        Self { servers: RwLock::new(HashMap::new()), tool_cache: RwLock::new(HashMap::new()), oauth: OAuthRegistry::new() }
    }

    /// Establishes a transport for `server_key` per `config.transport_kind()`.
    /// Re-connecting an already-connected key replaces its transport after
    /// disconnecting the old one.
    pub async fn connect_server(&self, server_key: &str, config: McpServerConfig) -> Result<(), McpError> {
        if config.disabled {
            return Ok(());
        }
        if let Some(auth) = &config.auth {
            if let Some(oauth) = &auth.oauth {
                self.oauth.install(server_key, oauth.clone());
            }
        }

        let transport: Arc<dyn Transport> = match config.transport_kind() {
            Some(TransportKind::Stdio) => {
                let command = config.command.clone().ok_or_else(|| McpError::Connection { server_key: server_key.to_string(), message: "stdio transport requires 'command'".into() })?;
                Arc::new(StdioTransport::spawn(server_key, &command, &config.args, &config.resolved_env())?)
            }
            Some(TransportKind::Http) => {
                let url = config.url.clone().ok_or_else(|| McpError::Connection { server_key: server_key.to_string(), message: "http transport requires 'url'".into() })?;
                let bearer = self.oauth.bearer_token(server_key);
                if self.oauth.requires_auth(server_key) {
                    return Err(McpError::Auth { server_key: server_key.to_string(), message: "OAuth authorization not completed".into() });
                }
                let mode = config.mode.unwrap_or(HttpMode::Streamable);
                Arc::new(HttpTransport::new(server_key, &url, config.resolved_headers(), bearer, mode)?)
            }
            Some(TransportKind::Custom) => {
                return Err(McpError::Connection { server_key: server_key.to_string(), message: "custom transport kind is reserved and not implemented".into() });
            }
            None => return Err(McpError::Connection { server_key: server_key.to_string(), message: "could not determine transport: set 'command', 'url', or 'type'".into() }),
        };

        let _ = transport.call("initialize", json!({"protocolVersion": "2024-11-05"})).await;

        let mut servers = self.servers.write().await;
        if let Some(previous) = servers.remove(server_key) {
            previous.transport.disconnect().await;
        }
        servers.insert(server_key.to_string(), ConnectedServer { transport, config });
        drop(servers);
        self.tool_cache.write().await.remove(server_key);
        Ok(())
    }

    async fn transport_for(&self, server_key: &str) -> Result<Arc<dyn Transport>, McpError> {
        self.servers.read().await.get(server_key).map(|s| s.transport.clone()).ok_or_else(|| McpError::UnknownServer(server_key.to_string()))
    }

    /// Fetches (and caches) `server_key`'s `tools/list`, namespaced as
    /// `serverKey_toolName`.
    pub async fn list_tools(&self, server_key: &str) -> Result<Vec<RewrittenToolSchema>, McpError> {
        if let Some(cached) = self.tool_cache.read().await.get(server_key) {
            return Ok(cached.clone());
        }
        let transport = self.transport_for(server_key).await?;
        let raw = transport.call("tools/list", Value::Null).await?;
        let descriptors = parse_tool_descriptors(&raw);
        let rewritten = rewrite_tool_schemas(server_key, &descriptors);
        self.tool_cache.write().await.insert(server_key.to_string(), rewritten.clone());
        Ok(rewritten)
    }

    /// Same as [`list_tools`](Self::list_tools) across every connected
    /// server, keyed by server key.
    pub async fn get_mcp_server_tool_schemas(&self) -> HashMap<String, Vec<RewrittenToolSchema>> {
        let keys: Vec<String> = self.servers.read().await.keys().cloned().collect();
        let mut out = HashMap::new();
        for key in keys {
            if let Ok(schemas) = self.list_tools(&key).await {
                out.insert(key, schemas);
            }
        }
        out
    }

    /// Invokes `tool_name` (the server's original, unnamespaced name) on
    /// `server_key` with `arguments`, retrying transport-class failures up
    /// to [`DEFAULT_EXECUTE_RETRIES`] times. Never retried when `streaming`
    /// is set, since a partially-delivered stream can't be safely replayed.
    pub async fn execute_tool(&self, server_key: &str, tool_name: &str, arguments: Value, streaming: bool) -> Result<Value, McpError> {
        let transport = self.transport_for(server_key).await?;
        let params = json!({"name": tool_name, "arguments": arguments});
        let max_attempts = if streaming { 1 } else { DEFAULT_EXECUTE_RETRIES + 1 };

        let mut last_error = None;
        for attempt in 0..max_attempts {
            match transport.call("tools/call", params.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    last_error = Some(e);
                    sleep(RETRY_BASE_DELAY * 2u32.pow(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| McpError::UnknownServer(server_key.to_string())))
    }

    async fn passthrough(&self, server_key: &str, method: &str, params: Value) -> Result<Value, McpError> {
        let transport = self.transport_for(server_key).await?;
        match transport.call(method, params).await {
            Ok(value) => Ok(value),
            Err(McpError::Protocol { code: -32601, .. }) => Ok(json!({"_mcpMethodNotSupported": true})),
            Err(e) => Err(e),
        }
    }

    pub async fn list_resources(&self, server_key: &str) -> Result<Value, McpError> {
        self.passthrough(server_key, "resources/list", Value::Null).await
    }

    pub async fn read_resource(&self, server_key: &str, uri: &str) -> Result<Value, McpError> {
        self.passthrough(server_key, "resources/read", json!({"uri": uri})).await
    }

    pub async fn list_resource_templates(&self, server_key: &str) -> Result<Value, McpError> {
        self.passthrough(server_key, "resources/templates/list", Value::Null).await
    }

    pub async fn list_prompts(&self, server_key: &str) -> Result<Value, McpError> {
        self.passthrough(server_key, "prompts/list", Value::Null).await
    }

    pub async fn get_prompt(&self, server_key: &str, name: &str, arguments: Value) -> Result<Value, McpError> {
        self.passthrough(server_key, "prompts/get", json!({"name": name, "arguments": arguments})).await
    }

    /// Records an OAuth access token obtained out-of-band for `server_key`,
    /// unblocking a later [`connect_server`](Self::connect_server) call.
    pub fn complete_authentication(&self, server_key: &str, access_token: String) -> Result<(), McpError> {
        self.oauth.complete_authentication(server_key, access_token)
    }

    pub async fn disconnect_server(&self, server_key: &str) {
        if let Some(server) = self.servers.write().await.remove(server_key) {
            server.transport.disconnect().await;
        }
        self.tool_cache.write().await.remove(server_key);
    }

    pub async fn disconnect_all(&self) {
        let keys: Vec<String> = self.servers.read().await.keys().cloned().collect();
        for key in keys {
            self.disconnect_server(&key).await;
        }
    }
}

fn parse_tool_descriptors(raw: &Value) -> Vec<McpToolDescriptor> {
    raw.get("tools")
        .and_then(Value::as_array)
        .map(|tools| {
            tools
                .iter()
                .filter_map(|tool| {
                    let name = tool.get("name")?.as_str()?.to_string();
                    let description = tool.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
                    let input_schema = tool.get("inputSchema").cloned().unwrap_or_else(|| json!({"type": "object"}));
                    Some(McpToolDescriptor { original_name: name, description, input_schema })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tool_descriptors_from_raw_list_result() {
        let raw = json!({"tools": [{"name": "read_file", "description": "reads", "inputSchema": {"type": "object"}}]});
        let descriptors = parse_tool_descriptors(&raw);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].original_name, "read_file");
    }

    #[test]
    fn parses_empty_when_tools_field_missing() {
        assert!(parse_tool_descriptors(&json!({})).is_empty());
    }

    #[tokio::test]
    async fn execute_tool_on_unknown_server_fails() {
        let adapter = McpServiceAdapter::new();
        let result = adapter.execute_tool("ghost", "noop", json!({}), false).await;
        assert!(matches!(result, Err(McpError::UnknownServer(_))));
    }
}
