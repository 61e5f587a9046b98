//! Process termination as an explicit terminal action.
//!
//! Forced exit deliberately skips unwinding and every pending cleanup, so
//! it is not modelled as an error travelling up a `Result` chain. The
//! coordinator calls a [`ProcessExit`] instead.

use std::fmt;
use std::sync::Mutex;

/// Ends the process.
pub trait ProcessExit: Send + Sync + fmt::Debug {
    /// Terminates with `code`. Real implementations never return.
    fn exit(&self, code: i32);
}

/// Calls [`std::process::exit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdProcessExit;

impl ProcessExit for StdProcessExit {
    fn exit(&self, code: i32) {
        tracing::warn!(code, "terminating process");
        std::process::exit(code);
    }
}

/// Records exit requests instead of terminating.
///
/// For embedding the relay inside a larger process, and for tests.
#[derive(Debug, Default)]
pub struct ExitRecorder {
    codes: Mutex<Vec<i32>>,
}

impl ExitRecorder {
    /// Creates a recorder with no recorded exits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every exit code requested so far, oldest first.
    #[must_use]
    pub fn codes(&self) -> Vec<i32> {
        self.codes.lock().map(|codes| codes.clone()).unwrap_or_default()
    }
}

impl ProcessExit for ExitRecorder {
    fn exit(&self, code: i32) {
        tracing::warn!(code, "process exit requested (recorded)");
        if let Ok(mut codes) = self.codes.lock() {
            codes.push(code);
        }
    }
}
