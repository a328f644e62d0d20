//! Error types for the fragment cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fragment Cache Error Enum ==
/// Unified error type for the fragment cache and its host integration.
#[derive(Error, Debug)]
pub enum FragmentCacheError {
    /// Fragment configuration could not be loaded
    #[error("Invalid fragment configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid request or store input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache store failure
    #[error("Store error: {0}")]
    Store(String),

    /// A key generation observer failed; the key would be incomplete
    #[error("Key generation observer '{observer}' failed: {message}")]
    Observer { observer: String, message: String },

    /// A dispatched sub-request did not succeed
    #[error("Sub-request to {uri} failed with status {status}")]
    SubRequest { uri: String, status: StatusCode },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for FragmentCacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            FragmentCacheError::InvalidConfiguration(_) | FragmentCacheError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            FragmentCacheError::SubRequest { .. } => StatusCode::BAD_GATEWAY,
            FragmentCacheError::Store(_)
            | FragmentCacheError::Observer { .. }
            | FragmentCacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the fragment cache.
pub type Result<T> = std::result::Result<T, FragmentCacheError>;
