//! # zenux-shared
//!
//! Types and pure logic shared between the Zenux relay server and the chat
//! client: the relay wire contract, the SSE line codec used to reconstruct
//! streamed assistant replies, and the chat-title heuristic.
//!
//! Nothing in this crate performs I/O.

pub mod constants;
pub mod sse;
pub mod title;
pub mod wire;
