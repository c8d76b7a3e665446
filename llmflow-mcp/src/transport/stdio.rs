//! Child-process stdio transport: one JSON-RPC request per line written
//! to the child's stdin, one line read back from its stdout, per
//! `spec.md` §4.8's command transport.
//!
//! Disconnect escalation is closing stdin (letting a well-behaved MCP
//! server exit on EOF), waiting 100ms, then `SIGKILL` via
//! `Child::start_kill`. `tokio` has no portable way to send `SIGTERM`
//! specifically without an extra signal-handling dependency this
//! workspace doesn't otherwise need, so EOF-on-stdin stands in for it —
//! the same "ask nicely, then force" shape the spec calls for.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::{JsonRpcRequest, JsonRpcResponse, Transport, into_result};
use crate::error::McpError;

struct ChildIo {
    child: Child,
    stdin: tokio::process::ChildStdin,
    stdout: BufReader<tokio::process::ChildStdout>,
}

pub struct StdioTransport {
    server_key: String,
    io: Mutex<ChildIo>,
    next_id: AtomicU64,
}

impl StdioTransport {
    /// Spawns `command args...` with `env` merged over the current
    /// process environment (`PATH` passthrough is implicit: `env` only
    /// adds/overrides, it never clears the inherited environment).
    pub fn spawn(server_key: &str, command: &str, args: &[String], env: &HashMap<String, String>) -> Result<Self, McpError> {
        let mut cmd = Command::new(command);
        cmd.args(args).envs(env).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::null()).kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| McpError::Process { server_key: server_key.to_string(), message: e.to_string() })?;
        let stdin = child.stdin.take().ok_or_else(|| McpError::Process { server_key: server_key.to_string(), message: "child has no stdin".into() })?;
        let stdout = child.stdout.take().ok_or_else(|| McpError::Process { server_key: server_key.to_string(), message: "child has no stdout".into() })?;

        Ok(Self {
            server_key: server_key.to_string(),
            io: Mutex::new(ChildIo { child, stdin, stdout: BufReader::new(stdout) }),
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest { jsonrpc: "2.0", id, method, params };
        let mut line = serde_json::to_string(&request).map_err(|e| McpError::Process { server_key: self.server_key.clone(), message: e.to_string() })?;
        line.push('\n');

        let mut io = self.io.lock().await;
        io.stdin.write_all(line.as_bytes()).await.map_err(|e| McpError::Connection { server_key: self.server_key.clone(), message: e.to_string() })?;
        io.stdin.flush().await.map_err(|e| McpError::Connection { server_key: self.server_key.clone(), message: e.to_string() })?;

        let mut response_line = String::new();
        io.stdout.read_line(&mut response_line).await.map_err(|e| McpError::Connection { server_key: self.server_key.clone(), message: e.to_string() })?;
        if response_line.is_empty() {
            return Err(McpError::Connection { server_key: self.server_key.clone(), message: "child process closed stdout".into() });
        }

        let response: JsonRpcResponse = serde_json::from_str(response_line.trim()).map_err(|e| McpError::Protocol { server_key: self.server_key.clone(), code: -32700, message: e.to_string() })?;
        into_result(&self.server_key, response)
    }

    async fn disconnect(&self) {
        let mut io = self.io.lock().await;
        let _ = io.stdin.shutdown().await;
        if tokio::time::timeout(Duration::from_millis(100), io.child.wait()).await.is_err() {
            let _ = io.child.start_kill();
        }
    }
}
