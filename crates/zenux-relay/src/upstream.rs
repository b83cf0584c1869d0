//! HTTP client for the upstream AI gateway.
//!
//! Opens the chat-completion request in streaming mode and hands the raw
//! byte stream back to the relay handler. The relay never buffers the full
//! response; first-byte latency is the design goal.

use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

use zenux_shared::wire::UpstreamChatRequest;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Could not reach upstream gateway: {0}")]
    Connect(#[from] reqwest::Error),

    #[error("Upstream gateway returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for the upstream chat-completions endpoint.
pub struct UpstreamClient {
    http: reqwest::Client,
    chat_url: String,
    api_key: Option<String>,
}

impl UpstreamClient {
    pub fn new(chat_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            chat_url,
            api_key,
        }
    }

    /// Open a streaming chat-completion request.
    ///
    /// Returns the upstream byte stream on success. Chunks are pulled from
    /// it lazily by the outbound SSE body, so backpressure from the client
    /// propagates to the upstream read pace.
    pub async fn stream_chat(
        &self,
        request: &UpstreamChatRequest,
    ) -> Result<impl Stream<Item = reqwest::Result<Bytes>>, UpstreamError> {
        let mut builder = self
            .http
            .post(&self.chat_url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request);

        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.chars().take(512).collect::<String>();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes_stream())
    }
}
