//! Application Layer - Ports and orchestration.
//!
//! This layer contains the capability traits shared by the streaming client
//! and the HTTP layer, plus the reconnect supervisor that drives the client.

/// Port interfaces (message source, receive session).
pub mod ports;

/// Reconnect policy and supervisor.
pub mod services;
