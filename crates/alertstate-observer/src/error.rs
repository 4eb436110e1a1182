//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use alertstate_cache::CacheError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested state entry does not exist.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// An invalid path or query parameter was provided.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Metrics exposition was requested but no recorder is installed.
    #[error("metrics unavailable: {0}")]
    MetricsUnavailable(String),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Cache(CacheError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MetricsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
