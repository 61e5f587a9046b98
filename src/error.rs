//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the relay. Transport
//! failures on a single connection are reported through it and isolated by
//! the caller; they never abort work for other connections. Each variant
//! also maps to an HTTP status code and structured JSON error response for
//! the few plain HTTP paths (bad `client_id` on upgrade).
//!
//! Process termination is deliberately absent: it is a terminal action
//! (see [`crate::shutdown::ProcessExit`]), not an error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid client id: must not be empty",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 2000–2999 | Transport  | 502 Bad Gateway           |
/// | 3000–3999 | Server     | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The caller-supplied client identifier was rejected.
    #[error("invalid client id: {0}")]
    InvalidClientId(String),

    /// The transport refused a frame.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// A send did not complete within the configured deadline.
    #[error("send timed out after {timeout_ms} ms")]
    SendTimeout {
        /// Deadline that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The connection was already closed by either side.
    #[error("connection closed")]
    ConnectionClosed,

    /// Startup configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidClientId(_) => 1001,
            Self::SendFailed(_) => 2001,
            Self::SendTimeout { .. } => 2002,
            Self::ConnectionClosed => 2003,
            Self::Internal(_) => 3000,
            Self::Config(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidClientId(_) => StatusCode::BAD_REQUEST,
            Self::SendFailed(_) | Self::SendTimeout { .. } | Self::ConnectionClosed => {
                StatusCode::BAD_GATEWAY
            }
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for per-recipient transport failures.
    ///
    /// A broadcast treats these as "drop this recipient and carry on".
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::SendFailed(_) | Self::SendTimeout { .. } | Self::ConnectionClosed
        )
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
