//! Signal API WebSocket Adapter
//!
//! Implements the receive session against the signal-cli REST API
//! (`/v1/receive/<account>` in json-rpc mode):
//!
//! - **client**: connection lifecycle, receive loop, message buffer
//! - **codec**: JSON frame decoding

pub mod client;
pub mod codec;

pub use client::{StreamingClient, StreamingClientConfig};
pub use codec::{CodecError, JsonCodec};
