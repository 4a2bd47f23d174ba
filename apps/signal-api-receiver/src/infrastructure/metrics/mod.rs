//! Prometheus Metrics Module
//!
//! Exposes receiver metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Frames**: Frames read from the WebSocket, decode failures
//! - **Messages**: Accepted and rejected messages, current queue depth
//! - **Connection**: Connect attempts, receive loop exits, reconnects
//! - **HTTP**: Pop/flush requests served
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server port.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "signal_receiver_frames_received_total",
        "Total frames read from the signal-cli WebSocket"
    );
    describe_counter!(
        "signal_receiver_decode_errors_total",
        "Total frames dropped because they could not be decoded"
    );
    describe_counter!(
        "signal_receiver_messages_accepted_total",
        "Total messages appended to the queue"
    );
    describe_counter!(
        "signal_receiver_messages_rejected_total",
        "Total decoded messages dropped by the accept policy"
    );
    describe_gauge!(
        "signal_receiver_queue_depth",
        "Messages currently buffered for consumers"
    );

    describe_gauge!(
        "signal_receiver_connected",
        "1 while a WebSocket connection is open, 0 otherwise"
    );
    describe_counter!(
        "signal_receiver_connect_attempts_total",
        "Total WebSocket connection attempts by outcome"
    );
    describe_counter!(
        "signal_receiver_receive_loop_exits_total",
        "Total receive loop terminations by reason"
    );
    describe_counter!(
        "signal_receiver_reconnects_total",
        "Total successful reconnections after a receive loop exit"
    );

    describe_counter!(
        "signal_receiver_http_requests_total",
        "Total HTTP requests served by route"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome label for connection attempts.
#[derive(Debug, Clone, Copy)]
pub enum ConnectOutcome {
    /// Dial and handshake succeeded.
    Success,
    /// Dial or handshake failed.
    Failure,
}

impl ConnectOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Record a frame read from the WebSocket.
pub fn record_frame_received() {
    counter!("signal_receiver_frames_received_total").increment(1);
}

/// Record a frame that failed to decode.
pub fn record_decode_error() {
    counter!("signal_receiver_decode_errors_total").increment(1);
}

/// Record an accepted message along with the resulting queue depth.
#[allow(clippy::cast_precision_loss)]
pub fn record_message_accepted(queue_depth: usize) {
    counter!("signal_receiver_messages_accepted_total").increment(1);
    gauge!("signal_receiver_queue_depth").set(queue_depth as f64);
}

/// Record a message dropped by the accept policy.
pub fn record_message_rejected(reason: &'static str) {
    counter!(
        "signal_receiver_messages_rejected_total",
        "reason" => reason
    )
    .increment(1);
}

/// Update the queue depth gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_queue_depth(depth: usize) {
    gauge!("signal_receiver_queue_depth").set(depth as f64);
}

/// Update the connection gauge.
pub fn set_connected(connected: bool) {
    gauge!("signal_receiver_connected").set(if connected { 1.0 } else { 0.0 });
}

/// Record a connection attempt.
pub fn record_connect_attempt(outcome: ConnectOutcome) {
    counter!(
        "signal_receiver_connect_attempts_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a receive loop termination.
pub fn record_receive_loop_exit(reason: &'static str) {
    counter!(
        "signal_receiver_receive_loop_exits_total",
        "reason" => reason
    )
    .increment(1);
}

/// Record a successful reconnection.
pub fn record_reconnect() {
    counter!("signal_receiver_reconnects_total").increment(1);
}

/// Record an HTTP request.
pub fn record_http_request(route: &'static str, status: u16) {
    counter!(
        "signal_receiver_http_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_outcome_as_str() {
        assert_eq!(ConnectOutcome::Success.as_str(), "success");
        assert_eq!(ConnectOutcome::Failure.as_str(), "failure");
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        record_frame_received();
        record_decode_error();
        record_message_accepted(3);
        record_message_rejected("typing");
        set_connected(true);
        record_connect_attempt(ConnectOutcome::Failure);
        record_receive_loop_exit("closed");
        record_reconnect();
        record_http_request("pop", 204);
    }
}
