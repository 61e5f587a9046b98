//! System endpoints: health check and the browser test client.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::shutdown::ShutdownState;

/// Static HTML page with a minimal WebSocket client.
const INDEX_HTML: &str = include_str!("../../../static/index.html");

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process answers.
    pub status: String,
    /// Live WebSocket connections.
    pub active_connections: usize,
    /// Whether a termination request has been received.
    pub shutdown_in_progress: bool,
    /// Current lifecycle state.
    pub shutdown_state: String,
    /// Current server time (RFC 3339).
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// `GET /health` — Connection count and shutdown status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns the live connection count, whether shutdown has begun, and the current time. Read-only.",
    responses(
        (status = 200, description = "Service is answering", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let shutdown_state: ShutdownState = state.shutdown.state();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            active_connections: state.registry.count().await,
            shutdown_in_progress: state.shutdown.is_shutting_down(),
            shutdown_state: shutdown_state.as_str().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /` — Browser test client.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Test client page",
    responses(
        (status = 200, description = "HTML page", body = String, content_type = "text/html"),
    )
)]
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::RelayConfig;
    use crate::domain::test_support::{RecordingHandle, client};
    use crate::shutdown::ExitRecorder;

    async fn get_health(state: AppState) -> HealthResponse {
        let app = routes().with_state(state);
        let Ok(request) = Request::builder().uri("/health").body(Body::empty()) else {
            panic!("request build failed");
        };
        let Ok(response) = app.oneshot(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let Ok(health) = serde_json::from_slice::<HealthResponse>(&bytes) else {
            panic!("health body is not JSON");
        };
        health
    }

    #[tokio::test]
    async fn health_reports_connections_and_state() {
        let state = AppState::new(&RelayConfig::default(), Arc::new(ExitRecorder::new()));
        state.registry.register(client("a"), RecordingHandle::shared()).await;

        let health = get_health(state.clone()).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.active_connections, 1);
        assert!(!health.shutdown_in_progress);
        assert_eq!(health.shutdown_state, "running");

        state.shutdown.request_termination();
        let health = get_health(state).await;
        assert!(health.shutdown_in_progress);
        assert_eq!(health.shutdown_state, "draining");
    }

    #[tokio::test]
    async fn index_serves_html_client() {
        let Html(page) = index_handler().await;
        assert!(page.contains("/ws/"));
    }
}
