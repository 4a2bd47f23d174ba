//! Signal API WebSocket Client
//!
//! Connects to the signal-cli REST API receive stream and buffers the
//! messages it pushes until a consumer pops or flushes them.
//!
//! # Stream URL
//!
//! - `wss://<host>/v1/receive/<account>` (or `ws://` for plain HTTP setups)
//!
//! # Protocol
//!
//! Every text (or binary) frame is a single JSON-encoded message. Frames are
//! decoded, classified by the accept policy, and appended to the queue in
//! arrival order. Malformed frames are logged and dropped.
//!
//! # Concurrency
//!
//! The connection sits behind an async mutex that `receive_loop` holds for
//! its whole run, so `connect` cannot swap the connection out from under an
//! active read. The queue has its own lock and is never held across an
//! await, so `pop`/`flush` never wait on the network.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::codec::JsonCodec;
use crate::application::ports::{ConnectError, MessageSource, ReceiveError, ReceiveSession};
use crate::domain::filter::{AcceptPolicy, Verdict};
use crate::domain::message::Message;
use crate::domain::queue::MessageQueue;
use crate::infrastructure::metrics::{self, ConnectOutcome};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the streaming client.
#[derive(Debug, Clone)]
pub struct StreamingClientConfig {
    /// Fully qualified WebSocket URL, including `/v1/receive/<account>`.
    pub url: String,
    /// Which envelopes get buffered.
    pub accept: AcceptPolicy,
}

impl StreamingClientConfig {
    /// Create a configuration with the default accept policy.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            accept: AcceptPolicy::default(),
        }
    }

    /// Replace the accept policy.
    #[must_use]
    pub fn with_accept(mut self, accept: AcceptPolicy) -> Self {
        self.accept = accept;
        self
    }
}

// =============================================================================
// Streaming Client
// =============================================================================

/// WebSocket client buffering messages from the signal-cli REST API.
pub struct StreamingClient {
    config: StreamingClientConfig,
    codec: JsonCodec,
    connection: tokio::sync::Mutex<Option<WsStream>>,
    queue: MessageQueue,
}

impl StreamingClient {
    /// Create a client without connecting.
    #[must_use]
    pub fn new(config: StreamingClientConfig) -> Self {
        Self {
            config,
            codec: JsonCodec::new(),
            connection: tokio::sync::Mutex::new(None),
            queue: MessageQueue::new(),
        }
    }

    /// Create a client and open its first connection.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError` if the initial connection fails.
    pub async fn connected(config: StreamingClientConfig) -> Result<Self, ConnectError> {
        let client = Self::new(config);
        client.connect().await?;
        Ok(client)
    }

    /// Close any existing connection and open a new one.
    ///
    /// On failure the client is left without a connection.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError` if the URL is invalid or the dial/handshake
    /// fails.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let mut connection = self.connection.lock().await;

        if let Some(mut previous) = connection.take() {
            metrics::set_connected(false);
            if let Err(e) = previous.close(None).await {
                tracing::debug!(error = %e, "Error closing previous connection");
            }
        }

        tracing::info!(url = %self.config.url, "Connecting to the Signal API");

        match tokio_tungstenite::connect_async(self.config.url.as_str()).await {
            Ok((stream, _response)) => {
                metrics::record_connect_attempt(ConnectOutcome::Success);
                metrics::set_connected(true);
                *connection = Some(stream);
                Ok(())
            }
            Err(e) => {
                metrics::record_connect_attempt(ConnectOutcome::Failure);
                if matches!(e, WsError::Url(_) | WsError::HttpFormat(_)) {
                    return Err(ConnectError::InvalidEndpoint {
                        url: self.config.url.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(ConnectError::Dial(Box::new(e)))
            }
        }
    }

    /// Read frames until the connection fails, buffering accepted messages.
    ///
    /// Returns exactly once, with the error that ended the loop. The
    /// connection is dropped on return; call [`connect`](Self::connect)
    /// before running the loop again.
    pub async fn receive_loop(&self) -> ReceiveError {
        let mut connection = self.connection.lock().await;
        let Some(stream) = connection.as_mut() else {
            return ReceiveError::NotConnected;
        };

        tracing::info!("Starting the receive loop from the Signal API");

        let error = loop {
            match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => self.record_frame(text.as_str().as_bytes()),
                Some(Ok(WsMessage::Binary(data))) => self.record_frame(&data),
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame.map_or_else(
                        || "no close frame".to_string(),
                        |f| format!("{} {}", u16::from(f.code), f.reason.as_str()),
                    );
                    break ReceiveError::Closed(reason);
                }
                Some(Ok(_)) => {
                    // ping/pong are answered by the transport
                }
                Some(Err(e)) => break ReceiveError::Read(Box::new(e)),
                None => break ReceiveError::StreamEnded,
            }
        };

        tracing::warn!(error = %error, "Error returned by the websocket");
        *connection = None;
        metrics::set_connected(false);
        error
    }

    /// Remove and return the oldest buffered message.
    pub fn pop(&self) -> Option<Message> {
        let message = self.queue.pop();
        if message.is_some() {
            metrics::set_queue_depth(self.queue.len());
        }
        message
    }

    /// Take every buffered message in arrival order.
    pub fn flush(&self) -> Vec<Message> {
        let messages = self.queue.flush();
        metrics::set_queue_depth(0);
        messages
    }

    /// Number of buffered messages.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Decode, classify and buffer one frame.
    fn record_frame(&self, frame: &[u8]) {
        metrics::record_frame_received();

        let message = match self.codec.decode(frame) {
            Ok(message) => message,
            Err(e) => {
                metrics::record_decode_error();
                tracing::warn!(
                    error = %e,
                    frame = %String::from_utf8_lossy(frame),
                    "Error decoding frame"
                );
                return;
            }
        };

        match self.config.accept.classify(&message.envelope) {
            Verdict::Accept => {
                let depth = self.queue.push(message);
                metrics::record_message_accepted(depth);
                tracing::debug!(
                    frame = %String::from_utf8_lossy(frame),
                    queued = depth,
                    "Message recorded"
                );
            }
            Verdict::Reject(reason) => {
                metrics::record_message_rejected(reason.as_str());
                tracing::debug!(
                    reason = reason.as_str(),
                    frame = %String::from_utf8_lossy(frame),
                    "Ignoring message"
                );
            }
        }
    }
}

#[async_trait]
impl ReceiveSession for StreamingClient {
    async fn connect(&self) -> Result<(), ConnectError> {
        Self::connect(self).await
    }

    async fn receive_loop(&self) -> ReceiveError {
        Self::receive_loop(self).await
    }
}

impl MessageSource for StreamingClient {
    fn pop(&self) -> Option<Message> {
        Self::pop(self)
    }

    fn flush(&self) -> Vec<Message> {
        Self::flush(self)
    }
}
