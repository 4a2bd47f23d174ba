//! Command-Line Arguments
//!
//! Every flag falls back to an environment variable, so the receiver can be
//! configured from a `.env` file or a container environment alone.

use std::time::Duration;

use clap::Parser;

use super::settings::{ConfigError, DEFAULT_LISTEN_ADDR, ReceiverConfig};

/// Bridge a signal-cli REST API receive stream to HTTP polling.
#[derive(Debug, Clone, Parser)]
#[command(name = "signal-api-receiver", version, about)]
pub struct ReceiverArgs {
    /// The address to listen and serve on (`:port` binds all interfaces).
    #[arg(long, env = "SIGNAL_RECEIVER_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub addr: String,

    /// The URL of the Signal API including the scheme, e.g. wss://signal-api.example.com.
    #[arg(long, env = "SIGNAL_API_URL")]
    pub signal_api_url: String,

    /// The account number for signal.
    #[arg(long, env = "SIGNAL_ACCOUNT")]
    pub signal_account: String,

    /// Delay between reconnection attempts, in milliseconds.
    #[arg(long, env = "SIGNAL_RECONNECT_DELAY_MS", default_value_t = 1000)]
    pub reconnect_delay_ms: u64,

    /// Envelope kinds to buffer: data, typing, receipt, sync, other.
    #[arg(long, env = "SIGNAL_ACCEPT_KINDS", value_delimiter = ',', default_value = "data")]
    pub accept: Vec<String>,

    /// Also buffer data messages without text (attachments only, group updates).
    #[arg(long, env = "SIGNAL_ALLOW_EMPTY_DATA")]
    pub allow_empty_data: bool,
}

impl TryFrom<ReceiverArgs> for ReceiverConfig {
    type Error = ConfigError;

    fn try_from(args: ReceiverArgs) -> Result<Self, Self::Error> {
        Self::new(
            &args.addr,
            &args.signal_api_url,
            &args.signal_account,
            Duration::from_millis(args.reconnect_delay_ms),
            &args.accept,
            args.allow_empty_data,
        )
    }
}
