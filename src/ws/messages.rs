//! Outbound message texts.
//!
//! Everything the relay sends is human-readable UTF-8 text, not JSON.
//! Keeping the wording here gives every sender the same phrasing and lets
//! tests match on prefixes instead of literal strings.

use std::time::Duration;

use chrono::{DateTime, Local};

use crate::domain::ClientId;

/// Close code sent to connections refused during shutdown ("going away").
pub const SHUTDOWN_CLOSE_CODE: u16 = 1001;

/// Close reason sent to connections refused during shutdown.
pub const SHUTDOWN_CLOSE_REASON: &str = "server is shutting down";

/// Farewell sent to every connection right before a forced close.
pub const FAREWELL: &str = "Server is shutting down. Your connection will now be closed.";

/// Formats a timestamp the way every relay message shows it.
#[must_use]
pub fn stamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Personal greeting sent right after a connection is accepted.
#[must_use]
pub fn welcome(id: &ClientId) -> String {
    format!("Welcome, {id}! You are connected to the relay.")
}

/// Acknowledgment echoed to the sender of a message.
#[must_use]
pub fn ack(text: &str) -> String {
    format!("Message received: {text}")
}

/// A client's message as fanned out to everyone else.
#[must_use]
pub fn chat(at: DateTime<Local>, from: &ClientId, text: &str) -> String {
    format!("[{}] {from}: {text}", stamp(at))
}

/// Notice to the other clients that someone joined.
#[must_use]
pub fn joined(id: &ClientId, active: usize) -> String {
    format!("Client {id} joined. Active clients: {active}")
}

/// Notice to the remaining clients that someone left.
#[must_use]
pub fn left(id: &ClientId, active: usize) -> String {
    format!("Client {id} left. Active clients: {active}")
}

/// Status line sent by the periodic announcer.
#[must_use]
pub fn periodic_status(at: DateTime<Local>, active: usize) -> String {
    format!("Periodic broadcast [{}]: active clients: {active}", stamp(at))
}

/// Warning broadcast once when draining begins.
#[must_use]
pub fn drain_warning(grace: Duration) -> String {
    format!(
        "WARNING: the server is shutting down.\n\
         It will stop in {}.\n\
         Please save your work and disconnect.",
        human_duration(grace)
    )
}

/// Renders a grace period as `N seconds` or `N minutes`.
fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        1 => "1 second".to_string(),
        s if s >= 120 && s % 60 == 0 => format!("{} minutes", s / 60),
        60 => "1 minute".to_string(),
        s => format!("{s} seconds"),
    }
}
