//! Service layer: fan-out and background announcements.
//!
//! [`Broadcaster`] delivers text to registered connections with
//! per-recipient failure isolation, and [`run_announcer`] drives it on a
//! fixed period until shutdown.

pub mod announcer;
pub mod broadcast;

pub use announcer::run_announcer;
pub use broadcast::{BroadcastReport, Broadcaster};
