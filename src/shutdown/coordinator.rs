//! Drain-then-terminate shutdown state machine.
//!
//! ```text
//!  Running ──first request──▶ Draining ──deadline / no clients──▶ Terminating
//!                                │
//!                       second request: exit(1) now
//! ```
//!
//! The first termination request fires the [`ShutdownSignal`]. From then
//! on new sessions are refused while existing ones keep working. With no
//! clients the server stops right away. Otherwise every client is warned
//! once, and when the grace period runs out the remaining connections get
//! a farewell, are closed, and the process exits. A second request at any
//! point after the first exits immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::exit::ProcessExit;
use super::state::{ShutdownSignal, ShutdownState};
use crate::config::RelayConfig;
use crate::service::Broadcaster;
use crate::ws::messages;

/// Exit code of a clean forced termination after the grace period.
pub const EXIT_AFTER_DRAIN: i32 = 0;

/// Exit code of an impatient second termination request.
pub const EXIT_ESCALATED: i32 = 1;

/// What a termination request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationRequest {
    /// First request: draining has begun.
    BeginDrain,
    /// Repeated request: the process exit was invoked.
    ForcedExit,
}

/// How [`ShutdownCoordinator::run`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// No connections when shutdown began; the server was stopped.
    Idle,
    /// Every client left before the deadline (only with
    /// `drain_exit_when_empty`).
    Drained,
    /// The deadline passed; remaining connections were force-closed and
    /// the process exit was invoked.
    Forced,
}

/// Timing knobs of the drain sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSettings {
    /// Grace period before forced termination.
    pub timeout: Duration,
    /// Deadline check cadence.
    pub poll_interval: Duration,
    /// Progress log cadence.
    pub progress_log_interval: Duration,
    /// Pause after the farewell pass before exiting.
    pub flush_pause: Duration,
    /// End the drain early once every client has left.
    pub exit_when_empty: bool,
}

impl From<&RelayConfig> for DrainSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            timeout: config.drain_timeout(),
            poll_interval: config.drain_poll_interval(),
            progress_log_interval: config.progress_log_interval(),
            flush_pause: config.flush_pause(),
            exit_when_empty: config.drain_exit_when_empty,
        }
    }
}

/// Owns the shutdown signal and drives the drain sequence.
///
/// Shared behind an [`Arc`]: the OS signal listener calls
/// [`request_termination`](Self::request_termination), a background task
/// runs [`run`](Self::run), and handlers read [`state`](Self::state).
#[derive(Debug)]
pub struct ShutdownCoordinator {
    broadcaster: Broadcaster,
    settings: DrainSettings,
    signal: ShutdownSignal,
    server_stop: CancellationToken,
    requested: AtomicBool,
    state: AtomicU8,
    exit: Arc<dyn ProcessExit>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator in the `Running` state.
    #[must_use]
    pub fn new(
        broadcaster: Broadcaster,
        settings: DrainSettings,
        exit: Arc<dyn ProcessExit>,
    ) -> Self {
        Self {
            broadcaster,
            settings,
            signal: ShutdownSignal::new(),
            server_stop: CancellationToken::new(),
            requested: AtomicBool::new(false),
            state: AtomicU8::new(ShutdownState::Running as u8),
            exit,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.signal.is_triggered()
    }

    /// Returns a clone of the shutdown signal for background tasks.
    #[must_use]
    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    /// Token cancelled when the HTTP server should stop serving.
    #[must_use]
    pub fn server_stop(&self) -> CancellationToken {
        self.server_stop.clone()
    }

    /// Handles one external termination request (SIGTERM, SIGINT, ...).
    ///
    /// The first request starts draining. Any later request is an
    /// escalation and invokes the process exit with [`EXIT_ESCALATED`]
    /// right away.
    pub fn request_termination(&self) -> TerminationRequest {
        if self
            .requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::info!("termination requested; starting graceful shutdown");
            self.advance(ShutdownState::Draining);
            self.signal.trigger();
            TerminationRequest::BeginDrain
        } else {
            tracing::warn!("repeated termination request; forcing exit");
            self.advance(ShutdownState::Terminating);
            self.exit.exit(EXIT_ESCALATED);
            TerminationRequest::ForcedExit
        }
    }

    /// Waits for the shutdown signal, then drains and terminates.
    ///
    /// Never hangs on misbehaving clients: every send is bounded and the
    /// final step is an unconditional process exit.
    pub async fn run(&self) -> ShutdownOutcome {
        tracing::info!("shutdown coordinator waiting for signal");
        self.signal.triggered().await;
        tracing::info!("graceful shutdown started");

        let registry = self.broadcaster.registry();
        let active = registry.count().await;
        if active == 0 {
            tracing::info!("no active connections; stopping server");
            self.advance(ShutdownState::Terminating);
            self.server_stop.cancel();
            return ShutdownOutcome::Idle;
        }

        let timeout = self.settings.timeout;
        tracing::info!(
            active,
            timeout_secs = timeout.as_secs(),
            "clients may keep working until the grace period ends"
        );
        self.broadcaster
            .broadcast_all(&messages::drain_warning(timeout))
            .await;

        let started = Instant::now();
        let deadline = started + timeout;
        let mut last_log = started;
        let mut poll = tokio::time::interval(self.settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => break,
                _ = poll.tick() => {}
            }

            if self.settings.exit_when_empty && registry.is_empty().await {
                tracing::info!("all clients left; stopping server before deadline");
                self.advance(ShutdownState::Terminating);
                self.server_stop.cancel();
                return ShutdownOutcome::Drained;
            }

            let now = Instant::now();
            if now.duration_since(last_log) >= self.settings.progress_log_interval {
                let remaining = deadline.saturating_duration_since(now);
                let active = registry.count().await;
                tracing::info!(
                    remaining_secs = remaining.as_secs_f32(),
                    active,
                    "shutdown pending; clients may keep working"
                );
                last_log = now;
            }
        }

        self.advance(ShutdownState::Terminating);
        let active = registry.count().await;
        tracing::warn!(
            timeout_secs = timeout.as_secs(),
            active,
            "grace period elapsed; force-closing remaining connections"
        );
        self.broadcaster.close_all(messages::FAREWELL).await;
        tracing::info!("all connections closed; terminating");

        tokio::time::sleep(self.settings.flush_pause).await;
        self.server_stop.cancel();
        self.exit.exit(EXIT_AFTER_DRAIN);
        ShutdownOutcome::Forced
    }

    /// Moves the state forward; never backwards.
    fn advance(&self, next: ShutdownState) {
        self.state.fetch_max(next as u8, Ordering::SeqCst);
    }
}
