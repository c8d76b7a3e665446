//! Streamable-HTTP transport, falling back to SSE framing when a server
//! answers with a content type or status this transport's primary mode
//! doesn't recognize, per `spec.md` §4.8.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;
use llmflow_provider_utils::sse::{SseEvent, sse_events};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{JsonRpcRequest, JsonRpcResponse, Transport, into_result};
use crate::config::HttpMode;
use crate::error::McpError;

pub struct HttpTransport {
    server_key: String,
    url: String,
    headers: HashMap<String, String>,
    bearer_token: Option<String>,
    client: reqwest::Client,
    mode: RwLock<HttpMode>,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(server_key: &str, url: &str, headers: HashMap<String, String>, bearer_token: Option<String>, preferred_mode: HttpMode) -> Result<Self, McpError> {
        let parsed = url::Url::parse(url).map_err(|e| McpError::Connection { server_key: server_key.to_string(), message: format!("invalid server URL: {e}") })?;
        let is_local = matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1") | Some("::1"));
        if parsed.scheme() != "https" && !is_local {
            return Err(McpError::Connection { server_key: server_key.to_string(), message: "HTTPS is required for remote MCP servers".into() });
        }
        let client = reqwest::Client::builder().build().map_err(|e| McpError::Connection { server_key: server_key.to_string(), message: e.to_string() })?;
        Ok(Self {
            server_key: server_key.to_string(),
            url: url.to_string(),
            headers,
            bearer_token,
            client,
            mode: RwLock::new(preferred_mode),
            next_id: AtomicU64::new(1),
        })
    }

    fn build_request(&self, body: &JsonRpcRequest<'_>) -> reqwest::RequestBuilder {
        let mut req = self.client.post(&self.url).json(body);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn call_streamable(&self, body: &JsonRpcRequest<'_>) -> Result<reqwest::Response, McpError> {
        self.build_request(body)
            .header("Accept", "application/json, text/event-stream")
            .send()
            .await
            .map_err(|e| McpError::Connection { server_key: self.server_key.clone(), message: e.to_string() })
    }

    async fn call_sse(&self, body: &JsonRpcRequest<'_>) -> Result<Value, McpError> {
        let response = self
            .build_request(body)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| McpError::Connection { server_key: self.server_key.clone(), message: e.to_string() })?;
        let byte_stream = response.bytes_stream().map(|r| r.map_err(std::io::Error::other));
        let mut events = Box::pin(sse_events::<std::io::Error>(byte_stream));
        while let Some(event) = events.next().await {
            match event {
                Ok(SseEvent::Data(data)) => {
                    let response: JsonRpcResponse = serde_json::from_str(&data).map_err(|e| McpError::Protocol { server_key: self.server_key.clone(), code: -32700, message: e.to_string() })?;
                    return into_result(&self.server_key, response);
                }
                Err(e) => return Err(McpError::Connection { server_key: self.server_key.clone(), message: e.to_string() }),
            }
        }
        Err(McpError::Connection { server_key: self.server_key.clone(), message: "SSE stream ended without a response".into() })
    }

    /// Whether this response indicates the server doesn't speak
    /// Streamable-HTTP and the transport should drop to SSE framing.
    fn should_fall_back(status: reqwest::StatusCode, content_type: &str) -> bool {
        matches!(status, reqwest::StatusCode::NOT_FOUND | reqwest::StatusCode::METHOD_NOT_ALLOWED) || content_type.contains("text/event-stream")
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest { jsonrpc: "2.0", id, method, params };

        let current_mode = *self.mode.read().await;
        if current_mode == HttpMode::Sse {
            return self.call_sse(&request).await;
        }

        let response = self.call_streamable(&request).await?;
        let status = response.status();
        let content_type = response.headers().get("content-type").and_then(|v| v.to_str().ok()).unwrap_or("").to_string();

        if Self::should_fall_back(status, &content_type) {
            *self.mode.write().await = HttpMode::Sse;
            return self.call_sse(&request).await;
        }

        if content_type.contains("text/event-stream") {
            let byte_stream = response.bytes_stream().map(|r| r.map_err(std::io::Error::other));
            let mut events = Box::pin(sse_events::<std::io::Error>(byte_stream));
            while let Some(event) = events.next().await {
                match event {
                    Ok(SseEvent::Data(data)) => {
                        let response: JsonRpcResponse = serde_json::from_str(&data).map_err(|e| McpError::Protocol { server_key: self.server_key.clone(), code: -32700, message: e.to_string() })?;
                        return into_result(&self.server_key, response);
                    }
                    Err(e) => return Err(McpError::Connection { server_key: self.server_key.clone(), message: e.to_string() }),
                }
            }
            return Err(McpError::Connection { server_key: self.server_key.clone(), message: "stream ended without a response".into() });
        }

        if !status.is_success() {
            return Err(McpError::Protocol { server_key: self.server_key.clone(), code: status.as_u16() as i64, message: status.to_string() });
        }

        let body: JsonRpcResponse = response.json().await.map_err(|e| McpError::Protocol { server_key: self.server_key.clone(), code: -32700, message: e.to_string() })?;
        into_result(&self.server_key, body)
    }

    async fn disconnect(&self) {}
}
