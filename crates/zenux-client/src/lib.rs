//! # zenux-client
//!
//! Client-side core of the Zenux AI chat: the stream consumer that
//! reconstructs assistant replies from the relay's SSE byte stream, the
//! per-turn state machine with user-triggered cancellation, and the
//! persistence glue that records finished turns in the local store.
//!
//! The relay transport is a trait seam ([`relay::RelayTransport`]) so the
//! whole send/stream/persist flow can be driven without a network in tests,
//! and so UI hosts can inject their own HTTP stack.

pub mod cancel;
pub mod consumer;
pub mod events;
pub mod relay;
pub mod session;
pub mod turn;

mod error;

pub use cancel::CancelHandle;
pub use error::ClientError;
pub use session::{ChatClient, SendResult};
pub use turn::TurnOutcome;
