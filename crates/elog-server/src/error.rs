//! Error types for the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use elog_index::IndexError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Message returned for every internal failure.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Result type alias for handler operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// The request body or parameters are invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The log store failed to reach or use the search engine.
    #[error("log store error: {0}")]
    Store(#[from] IndexError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "invalid_request",
                    message,
                },
            ),
            other => {
                // Transport detail stays in the log, never in the response.
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "internal_error",
                        message: INTERNAL_ERROR_MESSAGE.to_string(),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
