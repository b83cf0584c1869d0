//! Relay transport seam.
//!
//! [`RelayTransport`] abstracts "open a streaming chat request" so the
//! send/consume/persist flow can run against a scripted stream in tests.
//! [`HttpRelayTransport`] is the production implementation over reqwest.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use thiserror::Error;

use zenux_shared::wire::ChatRelayRequest;

/// Raw byte stream of one relay response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The relay could not be reached at all. Triggers the offline path:
    /// the outbound message is kept with `pending_sync` set.
    #[error("Relay unreachable: {0}")]
    Connect(String),

    /// The relay answered with a non-success status before streaming.
    #[error("Relay returned status {0}")]
    Status(u16),

    /// The stream broke while being read.
    #[error("Stream read failed: {0}")]
    Read(String),
}

/// Opens streaming chat requests against the relay.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn open_stream(&self, request: &ChatRelayRequest) -> Result<ByteStream, TransportError>;
}

/// HTTP implementation over `POST {base}/api/ai/chat`.
pub struct HttpRelayTransport {
    http: reqwest::Client,
    chat_url: String,
    bearer: Option<String>,
}

impl HttpRelayTransport {
    pub fn new(base_url: &str, bearer: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            chat_url: format!("{}/api/ai/chat", base_url.trim_end_matches('/')),
            bearer,
        }
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    async fn open_stream(&self, request: &ChatRelayRequest) -> Result<ByteStream, TransportError> {
        let mut builder = self
            .http
            .post(&self.chat_url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request);

        if let Some(ref token) = self.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| TransportError::Read(e.to_string()));

        Ok(Box::pin(stream))
    }
}
