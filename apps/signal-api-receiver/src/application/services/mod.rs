//! Application Services
//!
//! Services that orchestrate the receive session.
//!
//! - `ReconnectPolicy`: fixed-delay retry bookkeeping
//! - `ReconnectSupervisor`: receive/reconnect state machine

pub mod reconnect;
pub mod supervisor;

pub use reconnect::{DEFAULT_RECONNECT_DELAY, ReconnectConfig, ReconnectPolicy};
pub use supervisor::{ReconnectSupervisor, SupervisorState};
