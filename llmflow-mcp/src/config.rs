//! The persisted-state MCP config shape a caller passes in, per
//! `spec.md` §6's `{ mcpServers: { <key>: {...} } }` JSON, plus
//! `${NAME}` environment-template substitution for `env`/`headers`
//! values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How a server's transport is chosen. `Stdio`/`Http` are inferred from
/// which of `command`/`url` is present when `kind` is left unset;
/// `Custom` is reserved and never auto-selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    Http,
    Custom,
}

/// Whether an HTTP transport speaks Streamable-HTTP or falls back to SSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMode {
    Streamable,
    Sse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    pub redirect_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Advertised during dynamic client registration when no
    /// `client_id` is pre-registered.
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

fn default_client_name() -> String {
    "llmflow".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpAuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransportKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<HttpMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<McpAuthConfig>,
    #[serde(default)]
    pub disabled: bool,
}

impl McpServerConfig {
    /// Resolves the effective transport: explicit `kind` wins; otherwise
    /// `command` implies stdio and `url` implies http, per `spec.md`
    /// §4.8's transport-selection rule.
    pub fn transport_kind(&self) -> Option<TransportKind> {
        if let Some(kind) = self.kind {
            return Some(kind);
        }
        if self.command.is_some() {
            return Some(TransportKind::Stdio);
        }
        if self.url.is_some() {
            return Some(TransportKind::Http);
        }
        None
    }

    /// `env`/`headers` values with `${NAME}` templates substituted from
    /// the current process environment.
    pub fn resolved_env(&self) -> HashMap<String, String> {
        self.env.iter().map(|(k, v)| (k.clone(), substitute_env_template(v))).collect()
    }

    pub fn resolved_headers(&self) -> HashMap<String, String> {
        self.headers.iter().map(|(k, v)| (k.clone(), substitute_env_template(v))).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers")]
    pub mcp_servers: HashMap<String, McpServerConfig>,
}

/// Replaces every `${NAME}` occurrence in `template` with the matching
/// environment variable, leaving the template text in place if the
/// variable is unset.
pub fn substitute_env_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => out.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_implies_stdio_transport() {
        let cfg = McpServerConfig { command: Some("node".into()), ..Default::default() };
        assert_eq!(cfg.transport_kind(), Some(TransportKind::Stdio));
    }

    #[test]
    fn url_implies_http_transport() {
        let cfg = McpServerConfig { url: Some("https://mcp.example.com".into()), ..Default::default() };
        assert_eq!(cfg.transport_kind(), Some(TransportKind::Http));
    }

    #[test]
    fn substitutes_known_variable() {
        unsafe { std::env::set_var("LLMFLOW_MCP_TEST_TOKEN", "secret123") };
        assert_eq!(substitute_env_template("Bearer ${LLMFLOW_MCP_TEST_TOKEN}"), "Bearer secret123");
        unsafe { std::env::remove_var("LLMFLOW_MCP_TEST_TOKEN") };
    }

    #[test]
    fn leaves_unknown_variable_template_untouched() {
        assert_eq!(substitute_env_template("${LLMFLOW_MCP_DOES_NOT_EXIST}"), "${LLMFLOW_MCP_DOES_NOT_EXIST}");
    }
}
