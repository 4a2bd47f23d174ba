#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Signal API Receiver - WebSocket to HTTP polling bridge
//!
//! Holds one WebSocket connection to the signal-cli REST API receive stream
//! (`/v1/receive/<account>`), buffers inbound data messages in arrival
//! order, and hands them out over plain HTTP to consumers that cannot hold
//! a socket open.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Message schema, filtering and buffering
//!   - `message`: Envelope and data message wire types
//!   - `filter`: Accept policy for envelope kinds
//!   - `queue`: FIFO buffer
//!
//! - **Application**: Ports and orchestration
//!   - `ports`: Receive session and message source traits
//!   - `services`: Reconnect policy and supervisor
//!
//! - **Infrastructure**: Adapters and process-wide concerns
//!   - `signal`: WebSocket streaming client
//!   - `http`: Pop/flush HTTP server
//!   - `config`: CLI flags with environment fallbacks
//!   - `metrics`, `telemetry`: Prometheus metrics and tracing
//!
//! # Data Flow
//!
//! ```text
//!                     ┌─────────────────┐
//! Signal API WS ─────►│ StreamingClient │◄──── ReconnectSupervisor
//!                     │   (queue)       │
//!                     └────────┬────────┘
//!                              │ pop / flush
//!                     ┌────────▼────────┐
//!                     │   HTTP server   │◄──── GET /receive/pop
//!                     └─────────────────┘◄──── GET /receive/flush
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Message types with no transport dependencies.
pub mod domain;

/// Application layer - Ports and the reconnect supervisor.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::filter::{AcceptPolicy, RejectReason, Verdict};
pub use domain::message::{DataMessage, Envelope, EnvelopeKind, Message};
pub use domain::queue::MessageQueue;

// Ports and services
pub use application::ports::{ConnectError, MessageSource, ReceiveError, ReceiveSession};
pub use application::services::{ReconnectConfig, ReconnectSupervisor, SupervisorState};

// Streaming client
pub use infrastructure::signal::{StreamingClient, StreamingClientConfig};

// HTTP server
pub use infrastructure::http::{HttpServerError, ReceiveServer, router};

// Configuration
pub use infrastructure::config::{ConfigError, ReceiverArgs, ReceiverConfig};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
