//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use super::handlers::system;
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of the relay's HTTP endpoints.
///
/// The WebSocket endpoint `/ws/{client_id}` is not an OpenAPI operation
/// and is described in the crate docs instead.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "relay-gateway",
        description = "WebSocket message relay with drain-then-terminate shutdown"
    ),
    paths(system::health_handler, system::index_handler),
    components(schemas(system::HealthResponse, ErrorResponse, ErrorBody)),
    tags((name = "System", description = "Health and diagnostics"))
)]
pub struct ApiDoc;
