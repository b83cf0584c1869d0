//! Relay configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the relay can start with zero
//! configuration for local development.

use std::net::SocketAddr;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address for the HTTP (axum) server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Chat-completions endpoint of the upstream AI gateway.
    /// Env: `UPSTREAM_CHAT_URL`
    /// Default: `https://api.zenux.ai/v1/chat/completions`
    pub upstream_chat_url: String,

    /// Bearer token for the upstream gateway.
    /// Env: `UPSTREAM_API_KEY`
    /// Default: none (anonymous upstream access, dev only).
    pub upstream_api_key: Option<String>,

    /// Model name forwarded with every upstream request.
    /// Env: `UPSTREAM_MODEL`
    /// Default: `zenux-chat`
    pub model: String,

    /// Base URL of the auth provider used to verify bearer tokens.
    /// Env: `AUTH_URL`
    /// Default: `http://127.0.0.1:9999/auth/v1`
    pub auth_url: String,

    /// Project API key sent alongside token verification requests.
    /// Env: `AUTH_API_KEY`
    /// Default: none.
    pub auth_api_key: Option<String>,

    /// Whether requests without a bearer token are accepted, trusting the
    /// client-supplied `user_id`. This is the weaker development path;
    /// operators can close it by setting the env var to `false`.
    /// Env: `ALLOW_ANON` (true/false)
    /// Default: `true`
    pub allow_anonymous: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            upstream_chat_url: "https://api.zenux.ai/v1/chat/completions".to_string(),
            upstream_api_key: None,
            model: "zenux-chat".to_string(),
            auth_url: "http://127.0.0.1:9999/auth/v1".to_string(),
            auth_api_key: None,
            allow_anonymous: true,
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(url) = std::env::var("UPSTREAM_CHAT_URL") {
            config.upstream_chat_url = url;
        }

        if let Ok(key) = std::env::var("UPSTREAM_API_KEY") {
            if !key.is_empty() {
                config.upstream_api_key = Some(key);
            }
        }

        if let Ok(model) = std::env::var("UPSTREAM_MODEL") {
            config.model = model;
        }

        if let Ok(url) = std::env::var("AUTH_URL") {
            config.auth_url = url;
        }

        if let Ok(key) = std::env::var("AUTH_API_KEY") {
            if !key.is_empty() {
                config.auth_api_key = Some(key);
            }
        }

        if let Ok(val) = std::env::var("ALLOW_ANON") {
            config.allow_anonymous = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
