//! HTTP Polling Endpoint
//!
//! Maps the pop/flush routes onto a [`MessageSource`](crate::application::ports::MessageSource).
//! The server never touches the WebSocket connection; it only reads the
//! buffer, so it can be exercised against a plain queue.

pub mod server;

pub use server::{HttpServerError, ReceiveServer, SharedMessageSource, USAGE, router};
