//! Shutdown lifecycle states and the broadcastable shutdown signal.

use std::fmt;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

/// Where the relay is in its shutdown lifecycle.
///
/// Moves forward only: `Running → Draining → Terminating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownState {
    /// Accepting connections.
    Running = 0,
    /// Refusing new connections; existing sessions keep working until the
    /// grace period ends.
    Draining = 1,
    /// Closing everything; the process is about to exit.
    Terminating = 2,
}

impl ShutdownState {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Terminating => "terminating",
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Terminating,
        }
    }
}

impl fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot "shutdown requested" flag.
///
/// Written once by the [`super::ShutdownCoordinator`], observed by any
/// number of tasks. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Later calls have no effect.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the signal fires, immediately if it already has.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}
