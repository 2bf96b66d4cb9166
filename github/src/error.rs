//! Error types for the GitHub API client

use thiserror::Error;

/// Errors that can occur when interacting with the GitHub API
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Authentication failed - invalid or expired token
    #[error("Authentication failed. Invalid or expired token.")]
    Unauthorized,

    /// Requested GitHub resource does not exist
    #[error("GitHub resource not found: {endpoint}")]
    NotFound {
        /// Endpoint that returned 404
        endpoint: String,
    },

    /// Rate limited - too many requests
    #[error("Rate limited by the GitHub API")]
    RateLimited,

    /// API returned an unexpected error status
    #[error("GitHub API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body from the API
        message: String,
    },

    /// Request timed out before the API responded
    #[error("GitHub API request timed out")]
    Timeout,

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),
}

impl GitHubError {
    /// HTTP status associated with this error, where one exists.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited => Some(429),
            Self::Api { status, .. } => Some(*status),
            Self::Timeout | Self::RequestFailed(_) | Self::ResponseParseFailed(_) => None,
        }
    }
}
