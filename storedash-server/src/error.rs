//! Error types for the HTTP layer and server startup.

use axum::Json;
use axum::response::IntoResponse;
use http::StatusCode;
use thiserror::Error;
use tracing::error;

use storedash_postgres::StoreError;

/// Errors surfaced by API handlers.
///
/// Anything that is not an authentication failure collapses to a generic
/// internal error at the boundary; the cause is logged, never leaked.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid session.
    #[error("unauthorized")]
    Unauthorized,

    /// Internal failure.
    #[error("internal error")]
    Internal(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Internal(source) => {
                error!(error = %source, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Errors that can occur while starting the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Store data layer error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O error (bind, serve).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
