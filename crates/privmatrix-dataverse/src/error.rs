//! Error types for the Dataverse Web API backend.

use privmatrix_engine::ServiceError;
use thiserror::Error;

/// Result type alias using [`DataverseError`].
pub type DataverseResult<T> = Result<T, DataverseError>;

/// Errors that can occur when talking to Dataverse.
#[derive(Debug, Error)]
pub enum DataverseError {
    /// Configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// `OAuth2` authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Web API error payload.
    #[error("Web API error {code}: {message}")]
    Api { code: String, message: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Maximum retry attempts exceeded for rate limiting.
    #[error("maximum retries ({attempts}) exceeded for rate limit")]
    MaxRetriesExceeded { attempts: u32 },

    /// The response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<DataverseError> for ServiceError {
    fn from(err: DataverseError) -> Self {
        match err {
            DataverseError::Auth(message) => ServiceError::Auth(message),
            DataverseError::Api { code, message } => ServiceError::Api { code, message },
            DataverseError::Json(err) => ServiceError::InvalidResponse(err.to_string()),
            DataverseError::InvalidResponse(message) => ServiceError::InvalidResponse(message),
            other => ServiceError::Transport(other.to_string()),
        }
    }
}
