//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Nothing is reconfigured at runtime.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::RelayError;

/// Default bind address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// Seconds existing sessions may keep working after shutdown begins.
    pub drain_timeout_secs: u64,

    /// Seconds between periodic status broadcasts.
    pub broadcast_interval_secs: u64,

    /// Seconds between drain progress log lines.
    pub progress_log_interval_secs: u64,

    /// Milliseconds between deadline checks while draining.
    pub drain_poll_interval_ms: u64,

    /// Milliseconds to wait after the farewell pass before exiting.
    pub flush_pause_ms: u64,

    /// Upper bound in milliseconds for a single outbound send.
    pub send_timeout_ms: u64,

    /// End the drain early once every client has left.
    pub drain_exit_when_empty: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            drain_timeout_secs: 20,
            broadcast_interval_secs: 10,
            progress_log_interval_secs: 5,
            drain_poll_interval_ms: 1_000,
            flush_pause_ms: 500,
            send_timeout_ms: 5_000,
            drain_exit_when_empty: false,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or does not parse.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `LISTEN_ADDR` is set but cannot be
    /// parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();

        let raw_addr =
            std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse()
            .map_err(|e| RelayError::Config(format!("LISTEN_ADDR {raw_addr:?}: {e}")))?;

        let defaults = Self::default();
        Ok(Self {
            listen_addr,
            drain_timeout_secs: parse_env("DRAIN_TIMEOUT_SECS", defaults.drain_timeout_secs),
            broadcast_interval_secs: parse_env(
                "BROADCAST_INTERVAL_SECS",
                defaults.broadcast_interval_secs,
            ),
            progress_log_interval_secs: parse_env(
                "PROGRESS_LOG_INTERVAL_SECS",
                defaults.progress_log_interval_secs,
            ),
            drain_poll_interval_ms: parse_env(
                "DRAIN_POLL_INTERVAL_MS",
                defaults.drain_poll_interval_ms,
            ),
            flush_pause_ms: parse_env("FLUSH_PAUSE_MS", defaults.flush_pause_ms),
            send_timeout_ms: parse_env("SEND_TIMEOUT_MS", defaults.send_timeout_ms),
            drain_exit_when_empty: parse_env_bool(
                "DRAIN_EXIT_WHEN_EMPTY",
                defaults.drain_exit_when_empty,
            ),
        })
    }

    /// Grace period between the first termination request and forced close.
    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Period of the status announcer. Never zero.
    #[must_use]
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(self.broadcast_interval_secs.max(1))
    }

    /// Cadence of drain progress logging.
    #[must_use]
    pub const fn progress_log_interval(&self) -> Duration {
        Duration::from_secs(self.progress_log_interval_secs)
    }

    /// Cadence of deadline checks while draining. Never zero.
    #[must_use]
    pub fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_interval_ms.max(1))
    }

    /// Pause between the farewell pass and process exit.
    #[must_use]
    pub const fn flush_pause(&self) -> Duration {
        Duration::from_millis(self.flush_pause_ms)
    }

    /// Deadline for one outbound send.
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
