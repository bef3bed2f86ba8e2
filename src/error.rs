//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type of the crate. Startup failures
//! (bind, configuration) are fatal; the HTTP-facing variants render as a
//! structured JSON error response.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "page not found: public/index.html"
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category  | HTTP Status               |
/// |-----------|-----------|---------------------------|
/// | 1000–1999 | Startup   | 500 Internal Server Error |
/// | 2000–2999 | Not Found | 404 Not Found             |
/// | 3000–3999 | Server    | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The root page file is missing.
    #[error("page not found: {0}")]
    PageNotFound(String),

    /// No route matches the request path.
    #[error("route not found: {0}")]
    RouteNotFound(String),

    /// I/O failure outside of a single connection.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Bind { .. } => 1001,
            Self::Config(_) => 1002,
            Self::PageNotFound(_) => 2001,
            Self::RouteNotFound(_) => 2002,
            Self::Io(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::PageNotFound(_) | Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::Bind { .. } | Self::Config(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        let page = RelayError::PageNotFound("public/index.html".to_string());
        let route = RelayError::RouteNotFound("/nope".to_string());
        assert_eq!(page.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(route.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(page.error_code(), 2001);
        assert_eq!(route.error_code(), 2002);
    }

    #[test]
    fn bind_error_mentions_address() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 9998));
        let err = RelayError::Bind {
            addr,
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().contains("127.0.0.1:9998"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn into_response_uses_status() {
        let response = RelayError::RouteNotFound("/missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
