use thiserror::Error;

use crate::relay::TransportError;

/// Errors produced by the client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A second send was attempted while a response is still streaming for
    /// the same chat. Input should stay disabled until the turn settles.
    #[error("A response is already streaming for this chat")]
    TurnInFlight,

    /// Empty message text.
    #[error("Message text is empty")]
    EmptyMessage,

    /// Relay request failed before or while opening the stream.
    #[error("Relay transport error: {0}")]
    Transport(#[from] TransportError),

    /// The stream opened but failed before finalizing.
    #[error("Stream failed: {0}")]
    Stream(String),

    /// Local store failure.
    #[error("Store error: {0}")]
    Store(#[from] zenux_store::StoreError),

    /// Poisoned lock or other invariant breakage.
    #[error("Internal error: {0}")]
    Internal(String),
}
