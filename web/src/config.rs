//! Server configuration, read once from the environment at startup.
//!
//! Invalid values fail fast with a [`ConfigError`] instead of being silently
//! defaulted; in particular a scan gate capacity of zero is rejected before
//! any listener binds.

use repo_scanner_github::DEFAULT_BASE_URL;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 4000;

/// Default scan gate capacity.
pub const DEFAULT_MAX_CONCURRENT_SCANS: usize = 2;

/// Default per-request GitHub timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// A configuration value that could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held an unusable value.
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        /// Environment variable name.
        name: &'static str,
        /// The offending raw value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP listener binds.
    pub port: u16,
    /// Scan gate capacity; fixed for the life of the process.
    pub max_concurrent_scans: NonZeroUsize,
    /// Base url of the GitHub API.
    pub github_base_url: String,
    /// Per-request timeout for GitHub calls.
    pub request_timeout: Duration,
    /// Bounded wait for scan admission; `None` waits indefinitely.
    pub admission_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// Recognized variables: `PORT`, `MAX_CONCURRENT_REPO_SCANS`,
    /// `GITHUB_API_BASE_URL`, `REQUEST_TIMEOUT_MS`,
    /// `SCAN_ADMISSION_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any variable that is set but
    /// unparseable, and for a zero scan capacity.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_env("PORT", DEFAULT_PORT)?,
            max_concurrent_scans: capacity_from(parse_env(
                "MAX_CONCURRENT_REPO_SCANS",
                DEFAULT_MAX_CONCURRENT_SCANS,
            )?)?,
            github_base_url: std::env::var("GITHUB_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned()),
            request_timeout: Duration::from_millis(parse_env(
                "REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )?),
            admission_timeout: match std::env::var("SCAN_ADMISSION_TIMEOUT_MS") {
                Ok(raw) => Some(Duration::from_millis(parse_value(
                    "SCAN_ADMISSION_TIMEOUT_MS",
                    &raw,
                )?)),
                Err(_) => None,
            },
        })
    }
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_owned(),
        reason: "expected a number",
    })
}

fn capacity_from(value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value).ok_or(ConfigError::Invalid {
        name: "MAX_CONCURRENT_REPO_SCANS",
        value: value.to_string(),
        reason: "scan capacity must be greater than zero",
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_padded_numbers() {
        let port: u16 = parse_value("PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        let result: Result<u16, _> = parse_value("PORT", "eighty");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_parse_value_rejects_negative_capacity() {
        // usize parse fails on a sign, so negative capacities fail fast
        let result: Result<usize, _> = parse_value("MAX_CONCURRENT_REPO_SCANS", "-1");
        assert!(result.is_err());
    }

    #[test]
    fn test_capacity_zero_fails_fast() {
        let err = capacity_from(0).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_capacity_positive_is_accepted() {
        assert_eq!(capacity_from(2).unwrap().get(), 2);
    }
}
