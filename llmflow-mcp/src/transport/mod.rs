//! The `Transport` trait every MCP wire binding implements, plus the
//! JSON-RPC 2.0 envelope both [`stdio`] and [`http`] frame their
//! requests in.

pub mod http;
pub mod stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::McpError;

#[derive(Debug, Clone, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    params: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

fn into_result(server_key: &str, response: JsonRpcResponse) -> Result<Value, McpError> {
    if let Some(error) = response.error {
        return Err(crate::error::map_json_rpc_error(server_key, error.code, error.message));
    }
    Ok(response.result.unwrap_or(Value::Null))
}

/// One open connection to an MCP server: sends a JSON-RPC `method` call
/// with `params`, returns the decoded `result` or a mapped [`McpError`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, McpError>;

    /// Releases the transport's resources. For a stdio transport this
    /// escalates SIGTERM→SIGKILL per `spec.md` §4.8; HTTP transports
    /// simply drop their client.
    async fn disconnect(&self);
}

pub use http::HttpTransport;
pub use stdio::StdioTransport;
