use thiserror::Error;

use super::common::ApiErrorDetails;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        #[source]
        details: Option<Box<ApiErrorDetails>>,
    },

    #[error("Resource not found: {message}")]
    NotFound {
        code: Option<String>,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Service error code reported in the response body, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { code, .. } => code.as_deref(),
            ApiError::ApiError {
                details: Some(details),
                ..
            } => details.code.as_deref(),
            _ => None,
        }
    }
}
