//! Application state for Axum handlers.

use repo_scanner_github::GitHubApi;
use repo_scanner_scanner::ScanExecutor;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Holds the scan executor, which owns the service and the admission
/// controller over the process-wide gate. The GitHub boundary is a trait
/// object so tests can swap in a scripted mock.
#[derive(Clone)]
pub struct AppState {
    executor: Arc<ScanExecutor<dyn GitHubApi>>,
}

impl AppState {
    /// State over the given executor.
    #[must_use]
    pub fn new(executor: Arc<ScanExecutor<dyn GitHubApi>>) -> Self {
        Self { executor }
    }

    /// The scan executor.
    #[must_use]
    pub fn executor(&self) -> &ScanExecutor<dyn GitHubApi> {
        &self.executor
    }
}
