//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the ports defined in the application layer,
//! plus the process-wide concerns (configuration, logging, metrics).

/// Signal API WebSocket client.
pub mod signal;

/// HTTP polling endpoint.
pub mod http;

/// Command-line and environment configuration.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing.
pub mod telemetry;
