//! MCP (Model-Context-Protocol) server adapter: transport selection,
//! OAuth, and tool/resource/prompt passthrough, per `spec.md` §4.8.
//!
//! `llmflow-core` depends on this crate (not the reverse), so it defines
//! its own [`error::McpError`] rather than reusing `llmflow-core`'s error
//! type; the orchestration layer maps between the two at the call site.

pub mod adapter;
pub mod config;
pub mod error;
pub mod oauth;
pub mod tools;
pub mod transport;

pub use adapter::McpServiceAdapter;
pub use config::{HttpMode, McpAuthConfig, McpConfig, McpServerConfig, OAuthConfig, TransportKind};
pub use error::McpError;
pub use tools::{McpToolDescriptor, RewrittenToolSchema};
