//! HTTP API: router construction and the streaming chat relay handler.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures::StreamExt;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use zenux_shared::wire::{ChatRelayRequest, UpstreamChatRequest, UpstreamMessage};

use crate::auth::{extract_bearer, AuthVerifier};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::upstream::UpstreamClient;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub auth: Arc<AuthVerifier>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<RelayConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/ai/chat", post(ai_chat))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The streaming chat relay.
///
/// Authenticates the caller, forwards the message to the upstream gateway,
/// and pipes each upstream chunk back to the client as one SSE `data:`
/// event. The response is never buffered; chunks are pulled from upstream
/// only as fast as the client consumes them.
///
/// Failure semantics: a missing `message` is rejected with 400 before any
/// upstream call; an invalid bearer token with 401. Upstream failures are
/// surfaced as a single in-band `data: {"error": ...}` event, because by
/// the time they can occur the client is already committed to
/// stream-reading mode.
async fn ai_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRelayRequest>,
) -> Result<Response, RelayError> {
    if request.message.trim().is_empty() {
        return Err(RelayError::BadRequest("Missing 'message' field".to_string()));
    }

    // The verified identity always overrides the client-supplied user_id.
    let user_id = match extract_bearer(&headers) {
        Some(token) => {
            let verified = state.auth.verify(token).await?;
            Some(verified.id)
        }
        None => {
            if !state.config.allow_anonymous {
                return Err(RelayError::Unauthorized(
                    "Missing bearer token".to_string(),
                ));
            }
            warn!("No bearer token; trusting client-supplied user_id");
            request.user_id.clone()
        }
    };

    info!(
        user = user_id.as_deref().unwrap_or("<anonymous>"),
        conversation = ?request.conversation_id,
        "Relaying chat request upstream"
    );

    let upstream_request = UpstreamChatRequest {
        model: state.config.model.clone(),
        messages: vec![UpstreamMessage::user(&request.message)],
        stream: true,
    };

    let upstream_stream = match state.upstream.stream_chat(&upstream_request).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Upstream chat request failed");
            return sse_response(Body::from(error_frame(&e.to_string())));
        }
    };

    let body_stream = upstream_stream.map(|chunk| -> Result<Bytes, Infallible> {
        match chunk {
            Ok(bytes) => Ok(data_frame(&bytes)),
            Err(e) => {
                warn!(error = %e, "Upstream stream error mid-response");
                Ok(error_frame(&e.to_string()))
            }
        }
    });

    sse_response(Body::from_stream(body_stream))
}

/// Wrap one upstream chunk in SSE framing, verbatim. The client performs
/// all JSON interpretation.
fn data_frame(chunk: &[u8]) -> Bytes {
    let mut frame = Vec::with_capacity(chunk.len() + 8);
    frame.extend_from_slice(b"data: ");
    frame.extend_from_slice(chunk);
    frame.extend_from_slice(b"\n\n");
    Bytes::from(frame)
}

/// One in-band error event.
fn error_frame(message: &str) -> Bytes {
    let payload = serde_json::json!({ "error": message });
    Bytes::from(format!("data: {payload}\n\n"))
}

fn sse_response(body: Body) -> Result<Response, RelayError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        // Disable proxy buffering so first-byte latency survives nginx.
        .header("x-accel-buffering", "no")
        .body(body)
        .map_err(|e| RelayError::Internal(format!("Failed to build SSE response: {e}")))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP relay server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state(config: RelayConfig) -> AppState {
        AppState {
            upstream: Arc::new(UpstreamClient::new(
                config.upstream_chat_url.clone(),
                config.upstream_api_key.clone(),
            )),
            auth: Arc::new(AuthVerifier::new(
                config.auth_url.clone(),
                config.auth_api_key.clone(),
            )),
            rate_limiter: RateLimiter::default(),
            config: Arc::new(config),
        }
    }

    #[test]
    fn data_frame_wraps_chunk_verbatim() {
        let frame = data_frame(br#"{"content":"hi"}"#);
        assert_eq!(&frame[..], b"data: {\"content\":\"hi\"}\n\n");
    }

    #[test]
    fn error_frame_is_json_with_error_key() {
        let frame = error_frame("boom");
        let text = std::str::from_utf8(&frame).unwrap();
        let payload = text.strip_prefix("data: ").unwrap().trim();
        let value: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(value["error"], "boom");
    }

    #[tokio::test]
    async fn health_endpoint_responds_ok() {
        let app = build_router(test_state(RelayConfig::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_message_rejected_before_upstream() {
        let app = build_router(test_state(RelayConfig::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/ai/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message": "  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_message_field_rejected_with_400() {
        let app = build_router(test_state(RelayConfig::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/ai/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"conversation_id": null}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn anonymous_requests_rejected_when_disallowed() {
        let config = RelayConfig {
            allow_anonymous: false,
            ..RelayConfig::default()
        };
        let app = build_router(test_state(config));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/ai/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message": "hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
