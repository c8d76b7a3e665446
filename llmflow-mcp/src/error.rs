//! `McpError`: the taxonomy this crate raises, kept independent of
//! `llmflow_core::CoreError` since `llmflow-core` depends on
//! `llmflow-mcp` (not the other way around) — the orchestration layer
//! maps these into `CoreError::Mcp`/`CoreError::McpTimeout` at the call
//! site instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("no server registered under key '{0}'")]
    UnknownServer(String),

    #[error("connection to MCP server '{server_key}' failed: {message}")]
    Connection { server_key: String, message: String },

    #[error("authentication required for MCP server '{server_key}': {message}")]
    Auth { server_key: String, message: String },

    #[error("MCP operation on '{server_key}' timed out after {timeout:?}")]
    Timeout { server_key: String, timeout: std::time::Duration },

    #[error("MCP server '{server_key}' rejected the call: invalid parameters: {message}")]
    InvalidParams { server_key: String, message: String },

    #[error("MCP protocol error from '{server_key}' ({code}): {message}")]
    Protocol { server_key: String, code: i64, message: String },

    #[error("no such tool '{tool_name}' on MCP server '{server_key}'")]
    NoSuchTool { server_key: String, tool_name: String },

    #[error("child process transport for '{server_key}' failed: {message}")]
    Process { server_key: String, message: String },
}

impl McpError {
    pub fn server_key(&self) -> &str {
        match self {
            Self::UnknownServer(k) => k,
            Self::Connection { server_key, .. }
            | Self::Auth { server_key, .. }
            | Self::Timeout { server_key, .. }
            | Self::InvalidParams { server_key, .. }
            | Self::Protocol { server_key, .. }
            | Self::NoSuchTool { server_key, .. }
            | Self::Process { server_key, .. } => server_key,
        }
    }

    /// Whether `execute_tool`'s retry loop should attempt this call
    /// again: network-class and timeout failures are retryable; auth and
    /// invalid-parameter failures are not, per `spec.md` §4.8.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. } | Self::Process { .. })
    }
}

/// Maps a JSON-RPC error code to an [`McpError`] variant, per `spec.md`
/// §4.8's `-32000/-32601/-32602` mapping.
pub fn map_json_rpc_error(server_key: &str, code: i64, message: String) -> McpError {
    match code {
        -32602 => McpError::InvalidParams { server_key: server_key.to_string(), message },
        -32601 => McpError::NoSuchTool { server_key: server_key.to_string(), tool_name: message },
        _ => McpError::Protocol { server_key: server_key.to_string(), code, message },
    }
}
