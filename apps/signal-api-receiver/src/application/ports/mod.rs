//! Port Interfaces
//!
//! Defines the capability traits between layers following the Hexagonal
//! Architecture pattern.
//!
//! ## Driven Port (Outbound)
//!
//! - `ReceiveSession`: a reconnectable streaming session that buffers what it
//!   receives. Driven by the reconnect supervisor.
//!
//! ## Driver Port (Inbound)
//!
//! - `MessageSource`: pop/flush access to buffered messages. The HTTP layer
//!   depends on this alone so it can run against a plain queue in tests.

use async_trait::async_trait;

use crate::domain::message::Message;
use crate::domain::queue::MessageQueue;

/// Error returned when a session cannot be (re)established.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The endpoint is not a valid WebSocket request target.
    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint {
        /// Endpoint that was dialed.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Dial or handshake failed.
    #[error("error creating a new websocket connection: {0}")]
    Dial(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Error that ends a receive loop.
///
/// None of these are fatal to the process; they tell the supervisor to
/// reconnect.
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    /// `receive_loop` was called without an open connection.
    #[error("not connected")]
    NotConnected,

    /// The peer sent a close frame.
    #[error("connection closed by peer: {0}")]
    Closed(String),

    /// The stream ended without a close frame.
    #[error("stream ended")]
    StreamEnded,

    /// Transport-level read failure.
    #[error("read failed: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ReceiveError {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::Closed(_) => "closed",
            Self::StreamEnded => "stream_ended",
            Self::Read(_) => "read",
        }
    }
}

/// Read access to buffered messages.
#[cfg_attr(test, mockall::automock)]
pub trait MessageSource: Send + Sync {
    /// Remove and return the oldest buffered message.
    fn pop(&self) -> Option<Message>;

    /// Take every buffered message in arrival order.
    fn flush(&self) -> Vec<Message>;
}

impl MessageSource for MessageQueue {
    fn pop(&self) -> Option<Message> {
        Self::pop(self)
    }

    fn flush(&self) -> Vec<Message> {
        Self::flush(self)
    }
}

/// A streaming session that can be re-established after failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiveSession: Send + Sync {
    /// Close any current connection and open a new one.
    async fn connect(&self) -> Result<(), ConnectError>;

    /// Read until the connection fails.
    ///
    /// Only ever returns on failure, so the return value is the error itself.
    async fn receive_loop(&self) -> ReceiveError;
}
