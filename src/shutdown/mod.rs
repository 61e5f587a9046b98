//! Orderly shutdown: drain existing sessions, then terminate.
//!
//! [`ShutdownCoordinator`] owns the one-shot [`ShutdownSignal`] and walks
//! the relay through [`ShutdownState`]. Process termination goes through
//! the [`ProcessExit`] seam so it stays out of the error path.

pub mod coordinator;
pub mod exit;
pub mod signals;
pub mod state;

pub use coordinator::{
    DrainSettings, EXIT_AFTER_DRAIN, EXIT_ESCALATED, ShutdownCoordinator, ShutdownOutcome,
    TerminationRequest,
};
pub use exit::{ExitRecorder, ProcessExit, StdProcessExit};
pub use signals::listen_for_signals;
pub use state::{ShutdownSignal, ShutdownState};
