//! API error types for the Jira client.

use thiserror::Error;

/// Errors that can occur when talking to the Jira API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed - invalid username or API token.
    #[error("Authentication failed: check your username and API token")]
    Unauthorized,

    /// Permission denied - the user lacks access to the resource.
    #[error("Permission denied: you don't have access to this resource")]
    Forbidden,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The request was rejected, usually an invalid JQL query.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited by the Jira API.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// Jira server error.
    #[error("Jira server error: {0}")]
    ServerError(String),

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Connection validation failed.
    #[error("Connection validation failed: {0}")]
    ConnectionFailed(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            400 => ApiError::BadRequest(context.to_string()),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(context.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }

    /// Whether the credentials were rejected (401) or access was refused (403).
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }

    /// Whether the failure is tied to a single request rather than the account:
    /// timeouts, dropped connections, throttling and 5xx responses.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_)
        )
    }
}
