//! Per-connection session loop.
//!
//! Handles the registration, receive loop and cleanup for a single
//! client. Each inbound message is acknowledged to its sender and relayed
//! to everyone else. The receive side has no timeout: a hung peer is
//! reclaimed when its transport errors or when a broadcast send to it
//! fails.

use std::fmt;
use std::sync::Arc;

use axum::extract::ws::Message;
use chrono::Local;
use futures_util::{Stream, StreamExt};

use super::messages;
use crate::app_state::AppState;
use crate::domain::{ClientId, SharedHandle};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Shutdown was already under way; the connection was never admitted.
    Refused,
    /// The client closed the connection or the stream ended.
    Closed,
    /// The transport reported an error.
    TransportError,
}

/// Runs one client session to completion.
///
/// `handle` is the outbound half, `inbound` yields the client's frames.
/// Deregistration and the departure notice always run once the loop ends,
/// whatever ended it.
pub async fn run_session<S, E>(
    state: AppState,
    id: ClientId,
    handle: SharedHandle,
    mut inbound: S,
) -> SessionEnd
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    if state.shutdown.is_shutting_down() {
        return refuse(&id, &handle).await;
    }

    state.registry.register(id.clone(), Arc::clone(&handle)).await;
    // A termination request may have landed between the check and the insert.
    if state.shutdown.is_shutting_down() {
        state.registry.deregister_handle(&id, &handle).await;
        return refuse(&id, &handle).await;
    }

    if let Err(err) = state
        .broadcaster
        .send_to(&handle, &messages::welcome(&id))
        .await
    {
        tracing::error!(client_id = %id, error = %err, "failed to send welcome");
    }
    let active = state.registry.count().await;
    state
        .broadcaster
        .broadcast_except(&messages::joined(&id, active), &id)
        .await;

    let end = loop {
        match inbound.next().await {
            Some(Ok(Message::Text(text))) => relay(&state, &id, &handle, text.as_str()).await,
            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => relay(&state, &id, &handle, text).await,
                Err(_) => tracing::warn!(client_id = %id, "ignoring non-UTF-8 binary frame"),
            },
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(Message::Close(_))) | None => {
                tracing::info!(client_id = %id, "client closed connection");
                break SessionEnd::Closed;
            }
            Some(Err(err)) => {
                tracing::error!(client_id = %id, error = %err, "websocket receive failed");
                break SessionEnd::TransportError;
            }
        }
    };

    state.registry.deregister_handle(&id, &handle).await;
    let remaining = state.registry.count().await;
    if remaining > 0 {
        state
            .broadcaster
            .broadcast_all(&messages::left(&id, remaining))
            .await;
    }
    end
}

/// Acknowledges `text` to its sender and fans it out to everyone else.
async fn relay(state: &AppState, id: &ClientId, handle: &SharedHandle, text: &str) {
    tracing::info!(client_id = %id, text, "message received");

    if let Err(err) = state.broadcaster.send_to(handle, &messages::ack(text)).await {
        tracing::error!(client_id = %id, error = %err, "failed to acknowledge message");
    }
    state
        .broadcaster
        .broadcast_except(&messages::chat(Local::now(), id, text), id)
        .await;
}

/// Closes a connection that arrived during shutdown.
async fn refuse(id: &ClientId, handle: &SharedHandle) -> SessionEnd {
    tracing::warn!(client_id = %id, "connection refused: server is shutting down");
    if let Err(err) = handle
        .close_with(messages::SHUTDOWN_CLOSE_CODE, messages::SHUTDOWN_CLOSE_REASON)
        .await
    {
        tracing::debug!(client_id = %id, error = %err, "refusal close frame not delivered");
    }
    SessionEnd::Refused
}
