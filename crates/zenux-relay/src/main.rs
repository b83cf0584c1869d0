//! # zenux-relay
//!
//! Streaming chat relay for Zenux AI.
//!
//! This binary provides:
//! - **`POST /api/ai/chat`**: authenticates the caller, forwards the chat
//!   request to the upstream AI gateway, and re-streams the upstream
//!   response to the client as SSE without buffering it
//! - **Bearer-token verification** against the auth provider, with the
//!   verified identity overriding any client-supplied user id
//! - **Per-caller rate limiting** to protect the upstream quota
//! - **REST API** (axum) for health checks

mod api;
mod auth;
mod config;
mod error;
mod rate_limit;
mod upstream;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::auth::AuthVerifier;
use crate::config::RelayConfig;
use crate::rate_limit::RateLimiter;
use crate::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,zenux_relay=debug")),
        )
        .init();

    info!("Starting Zenux relay v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = RelayConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        upstream = %config.upstream_chat_url,
        model = %config.model,
        allow_anonymous = config.allow_anonymous,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let upstream = Arc::new(UpstreamClient::new(
        config.upstream_chat_url.clone(),
        config.upstream_api_key.clone(),
    ));

    let auth = Arc::new(AuthVerifier::new(
        config.auth_url.clone(),
        config.auth_api_key.clone(),
    ));

    // Rate limiter: 2 req/s sustained per caller, burst of 10
    let rate_limiter = RateLimiter::default();

    let app_state = AppState {
        upstream,
        auth,
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP server (blocks until shutdown)
    // -----------------------------------------------------------------------
    let http_addr = config.http_addr;
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
