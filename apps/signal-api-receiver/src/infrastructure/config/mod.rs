//! Configuration Module
//!
//! Command-line/environment parsing and validation for the receiver.

mod args;
mod settings;

pub use args::ReceiverArgs;
pub use settings::{
    ConfigError, DEFAULT_LISTEN_ADDR, ReceiverConfig, parse_accept_policy, parse_listen_addr,
    receive_endpoint,
};
