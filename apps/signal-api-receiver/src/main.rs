//! Signal API Receiver Binary
//!
//! Connects to the Signal API receive stream and serves the buffered
//! messages over HTTP.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin signal-api-receiver -- \
//!     --signal-api-url wss://signal-api.example.com \
//!     --signal-account +15550000000
//! ```
//!
//! # Environment Variables
//!
//! ## Required (unless given as flags)
//! - `SIGNAL_API_URL`: Signal API URL including the scheme
//! - `SIGNAL_ACCOUNT`: Account number
//!
//! ## Optional
//! - `SIGNAL_RECEIVER_ADDR`: Listen address (default: :8105)
//! - `SIGNAL_RECONNECT_DELAY_MS`: Delay between reconnection attempts (default: 1000)
//! - `SIGNAL_ACCEPT_KINDS`: Envelope kinds to buffer (default: data)
//! - `SIGNAL_ALLOW_EMPTY_DATA`: Buffer data messages without text (default: false)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log filter (default: info)

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use signal_api_receiver::infrastructure::telemetry;
use signal_api_receiver::{
    ReceiveServer, ReceiverArgs, ReceiverConfig, ReconnectSupervisor, StreamingClient,
    StreamingClientConfig, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    let args = ReceiverArgs::parse();

    let _telemetry_guard = telemetry::init()?;

    tracing::info!("Starting Signal API Receiver");

    let _metrics_handle = init_metrics();

    let config = ReceiverConfig::try_from(args)?;
    log_config(&config);

    let client_config = StreamingClientConfig::new(config.endpoint.clone()).with_accept(config.accept.clone());
    let client = Arc::new(
        StreamingClient::connected(client_config)
            .await
            .with_context(|| format!("error creating a new receiver for {}", config.endpoint))?,
    );

    let supervisor = ReconnectSupervisor::new(Arc::clone(&client), config.reconnect);
    tokio::spawn(supervisor.run());

    let shutdown_token = CancellationToken::new();
    let server = ReceiveServer::new(config.listen_addr, client, shutdown_token.clone());

    tokio::spawn(await_shutdown(shutdown_token));

    server.run().await?;

    tracing::info!("Signal API Receiver stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &ReceiverConfig) {
    let kinds = config.accept.kinds();
    let accept: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
    tracing::info!(
        listen_addr = %config.listen_addr,
        account = %config.account,
        reconnect_delay = ?config.reconnect.delay,
        accept = ?accept,
        require_text = config.accept.require_text(),
        "Configuration loaded"
    );
    tracing::info!(url = %config.endpoint, "Signal API endpoint");
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM, then cancel the token.
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
