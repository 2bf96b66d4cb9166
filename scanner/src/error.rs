//! Error types for the scan service

use repo_scanner_gate::AdmissionError;
use repo_scanner_github::GitHubError;
use thiserror::Error;

/// Errors surfaced by scan operations
#[derive(Debug, Error)]
pub enum ScanError {
    /// A request argument failed validation
    #[error("{message}")]
    Validation {
        /// Name of the offending argument
        field: &'static str,
        /// Human-readable description
        message: String,
    },

    /// Admission to the scan gate failed (bounded wait elapsed)
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// The GitHub API reported an error
    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

impl ScanError {
    /// Shorthand for a validation failure.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
