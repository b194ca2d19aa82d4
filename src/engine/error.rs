//! Error types for search engine operations

use crate::error::AppError;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while talking to the search engine
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Engine could not be reached (refused, timed out, cluster not ready)
    #[error("Search engine unavailable: {0}")]
    Unavailable(String),

    /// Document or index does not exist
    #[error("{0}")]
    NotFound(String),

    /// Engine answered with a non-success status
    #[error("Search engine returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Failed to decode search engine response: {0}")]
    Decode(String),

    /// Request could not be built or sent
    #[error("Search engine client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            EngineError::Unavailable(err.to_string())
        } else if err.is_decode() {
            EngineError::Decode(err.to_string())
        } else {
            EngineError::Client(err.to_string())
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(msg) => AppError::NotFound(msg),
            EngineError::Unavailable(msg) => AppError::ServiceUnavailable(msg),
            EngineError::Decode(msg) => AppError::Serialization(msg),
            other => AppError::Integration {
                integration_source: "elasticsearch".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_app_error_mapping() {
        let not_found: AppError = EngineError::NotFound("Document 9 not found".into()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let down: AppError = EngineError::Unavailable("connection refused".into()).into();
        assert_eq!(down.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let status: AppError = EngineError::Status {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert_eq!(status.status_code(), StatusCode::BAD_GATEWAY);
    }
}
