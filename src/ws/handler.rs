//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::StreamExt;

use super::session::run_session;
use super::sink::WsHandle;
use crate::app_state::AppState;
use crate::domain::{ClientId, SharedHandle};
use crate::error::RelayError;

/// `GET /ws/{client_id}` — Upgrade HTTP connection to WebSocket.
///
/// During shutdown the upgrade still completes so the client receives a
/// proper 1001 close frame with a reason instead of a bare HTTP error.
///
/// # Errors
///
/// Returns [`RelayError::InvalidClientId`] if `client_id` is rejected.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, RelayError> {
    let id = ClientId::parse(&client_id)?;

    Ok(ws.on_upgrade(move |socket| async move {
        let (ws_tx, ws_rx) = socket.split();
        let handle: SharedHandle = Arc::new(WsHandle::new(ws_tx));
        let end = run_session(state, id.clone(), handle, ws_rx).await;
        tracing::debug!(client_id = %id, ?end, "ws session finished");
    }))
}
