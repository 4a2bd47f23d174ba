//! Reconnect Supervisor
//!
//! Drives a [`ReceiveSession`] for the lifetime of the process. The
//! supervisor alternates between two states:
//!
//! ```text
//!              receive_loop() returned
//!   RECEIVING ─────────────────────────► RECONNECTING ◄─┐
//!       ▲                                     │         │ connect() failed,
//!       └─────────────────────────────────────┘         │ sleep fixed delay
//!                connect() succeeded                    └─┘
//! ```
//!
//! There is no terminal state. Errors are logged and never surfaced to
//! consumers; buffered messages stay available throughout.

use std::sync::Arc;

use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use crate::application::ports::ReceiveSession;
use crate::infrastructure::metrics;

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Running the session's receive loop.
    Receiving,
    /// Re-establishing the connection.
    Reconnecting,
}

/// Two-state reconnect loop around a [`ReceiveSession`].
pub struct ReconnectSupervisor<S: ?Sized> {
    session: Arc<S>,
    policy: ReconnectPolicy,
    state: SupervisorState,
}

impl<S: ReceiveSession + ?Sized> ReconnectSupervisor<S> {
    /// Create a supervisor for a session that is already connected.
    #[must_use]
    pub const fn new(session: Arc<S>, config: ReconnectConfig) -> Self {
        Self {
            session,
            policy: ReconnectPolicy::new(config),
            state: SupervisorState::Receiving,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SupervisorState {
        self.state
    }

    /// Consecutive failed connection attempts in the current reconnect.
    #[must_use]
    pub const fn failed_attempts(&self) -> u32 {
        self.policy.attempt_count()
    }

    /// Perform one transition and return the new state.
    pub async fn step(&mut self) -> SupervisorState {
        match self.state {
            SupervisorState::Receiving => {
                let error = self.session.receive_loop().await;
                tracing::warn!(error = %error, "Error in the receive loop, reconnecting");
                metrics::record_receive_loop_exit(error.kind());
                self.state = SupervisorState::Reconnecting;
            }
            SupervisorState::Reconnecting => match self.session.connect().await {
                Ok(()) => {
                    tracing::info!(
                        failed_attempts = self.policy.attempt_count(),
                        "Reconnected to the Signal API"
                    );
                    metrics::record_reconnect();
                    self.policy.reset();
                    self.state = SupervisorState::Receiving;
                }
                Err(e) => {
                    let delay = self.policy.next_delay();
                    tracing::error!(
                        error = %e,
                        attempt = self.policy.attempt_count(),
                        delay_ms = delay.as_millis(),
                        "Error reconnecting"
                    );
                    tokio::time::sleep(delay).await;
                }
            },
        }

        self.state
    }

    /// Run forever.
    pub async fn run(mut self) {
        tracing::info!(
            delay_ms = self.policy.delay().as_millis(),
            "Starting reconnect supervisor"
        );
        loop {
            self.step().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use mockall::Sequence;
    use tokio::sync::mpsc;

    use super::*;
    use crate::application::ports::{ConnectError, MockReceiveSession, ReceiveError};

    fn config() -> ReconnectConfig {
        ReconnectConfig::new(Duration::from_millis(1))
    }

    fn refused() -> ConnectError {
        ConnectError::Dial("connection refused".into())
    }

    #[tokio::test]
    async fn starts_in_receiving_state() {
        let supervisor = ReconnectSupervisor::new(Arc::new(MockReceiveSession::new()), config());
        assert_eq!(supervisor.state(), SupervisorState::Receiving);
    }

    #[tokio::test]
    async fn receive_error_moves_to_reconnecting() {
        let mut session = MockReceiveSession::new();
        session
            .expect_receive_loop()
            .times(1)
            .returning(|| ReceiveError::StreamEnded);
        session.expect_connect().never();

        let mut supervisor = ReconnectSupervisor::new(Arc::new(session), config());
        assert_eq!(supervisor.step().await, SupervisorState::Reconnecting);
    }

    #[tokio::test]
    async fn failed_connect_is_retried_until_success() {
        let mut seq = Sequence::new();
        let mut session = MockReceiveSession::new();
        session
            .expect_receive_loop()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| ReceiveError::Closed("going away".to_string()));
        session
            .expect_connect()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|| Err(refused()));
        session
            .expect_connect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let mut supervisor = ReconnectSupervisor::new(Arc::new(session), config());

        assert_eq!(supervisor.step().await, SupervisorState::Reconnecting);
        assert_eq!(supervisor.step().await, SupervisorState::Reconnecting);
        assert_eq!(supervisor.failed_attempts(), 1);
        assert_eq!(supervisor.step().await, SupervisorState::Reconnecting);
        assert_eq!(supervisor.failed_attempts(), 2);
        assert_eq!(supervisor.step().await, SupervisorState::Receiving);
        assert_eq!(supervisor.failed_attempts(), 0);
    }

    #[tokio::test]
    async fn failed_connect_waits_the_configured_delay() {
        let mut session = MockReceiveSession::new();
        session.expect_connect().times(1).returning(|| Err(refused()));

        let mut supervisor = ReconnectSupervisor::new(
            Arc::new(session),
            ReconnectConfig::new(Duration::from_millis(50)),
        );
        supervisor.state = SupervisorState::Reconnecting;

        let started = tokio::time::Instant::now();
        supervisor.step().await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn successful_connect_does_not_wait() {
        let mut session = MockReceiveSession::new();
        session.expect_connect().times(1).returning(|| Ok(()));

        let mut supervisor =
            ReconnectSupervisor::new(Arc::new(session), ReconnectConfig::new(Duration::from_secs(60)));
        supervisor.state = SupervisorState::Reconnecting;

        let step = tokio::time::timeout(Duration::from_secs(1), supervisor.step()).await;
        assert_eq!(step.unwrap(), SupervisorState::Receiving);
    }

    /// Session whose receive loop ends whenever the test sends an error and
    /// whose connect results are scripted.
    struct ScriptedSession {
        receive_errors: tokio::sync::Mutex<mpsc::UnboundedReceiver<ReceiveError>>,
        connect_results: parking_lot::Mutex<VecDeque<bool>>,
        connects: AtomicUsize,
        receive_loops: AtomicUsize,
    }

    #[async_trait]
    impl ReceiveSession for ScriptedSession {
        async fn connect(&self) -> Result<(), ConnectError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let ok = self.connect_results.lock().pop_front().unwrap_or(true);
            if ok { Ok(()) } else { Err(refused()) }
        }

        async fn receive_loop(&self) -> ReceiveError {
            self.receive_loops.fetch_add(1, Ordering::SeqCst);
            self.receive_errors
                .lock()
                .await
                .recv()
                .await
                .unwrap_or(ReceiveError::StreamEnded)
        }
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while counter.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn run_loops_through_repeated_failures() {
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let session = Arc::new(ScriptedSession {
            receive_errors: tokio::sync::Mutex::new(error_rx),
            connect_results: parking_lot::Mutex::new(VecDeque::from([false, false, true, true])),
            connects: AtomicUsize::new(0),
            receive_loops: AtomicUsize::new(0),
        });

        let handle = tokio::spawn(ReconnectSupervisor::new(Arc::clone(&session), config()).run());

        wait_for(&session.receive_loops, 1).await;
        assert_eq!(session.connects.load(Ordering::SeqCst), 0);

        // first drop: two refused dials, then success
        error_tx.send(ReceiveError::StreamEnded).unwrap();
        wait_for(&session.receive_loops, 2).await;
        assert_eq!(session.connects.load(Ordering::SeqCst), 3);

        // second drop: immediate success
        error_tx
            .send(ReceiveError::Read("connection reset".into()))
            .unwrap();
        wait_for(&session.receive_loops, 3).await;
        assert_eq!(session.connects.load(Ordering::SeqCst), 4);

        assert!(!handle.is_finished());
        handle.abort();
    }
}
