//! Request execution: admission, fan-out, safety net.
//!
//! The executor owns the control flow around the service: it creates the
//! request's tracker, runs the admission decision before any field executes,
//! and runs the tracker's safety net before the result leaves, on the
//! success and the error path alike.

use crate::error::ScanError;
use crate::model::{Repository, RepositoryDetails};
use crate::operation::{DetailField, ScanOperation};
use crate::service::RepositoryService;
use repo_scanner_gate::{AdmissionController, FanOutListener, ScanTracker};
use repo_scanner_github::GitHubApi;
use std::sync::Arc;

/// Executes parsed operations with gate semantics applied.
#[derive(Debug)]
pub struct ScanExecutor<G: ?Sized> {
    service: RepositoryService<G>,
    admission: AdmissionController,
}

impl<G: GitHubApi + ?Sized> ScanExecutor<G> {
    /// Executor over a service and the process-wide admission controller.
    pub const fn new(service: RepositoryService<G>, admission: AdmissionController) -> Self {
        Self { service, admission }
    }

    /// The admission controller in use (exposed for health reporting).
    #[must_use]
    pub const fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Execute a listing request. The admission decision runs and concludes
    /// the operation is ungated; no slot is touched.
    ///
    /// # Errors
    ///
    /// Propagates service errors.
    pub async fn list_repositories(&self, token: &str) -> Result<Vec<Repository>, ScanError> {
        let operation = ScanOperation::ListRepositories;
        let tracker = ScanTracker::new();

        self.admission.admit(&operation, &tracker).await?;
        let result = self.service.list_repositories(token).await;
        tracker.finish();
        result
    }

    /// Execute a gated scan request.
    ///
    /// Suspends at admission while the gate is full. The slot is released by
    /// the fan-out listener when the last selected field finishes, or by the
    /// safety net here when no tracked field ever ran.
    ///
    /// # Errors
    ///
    /// Propagates validation, admission, and GitHub errors. The slot never
    /// outlives this call regardless of which path errors.
    pub async fn scan_repository(
        &self,
        token: &str,
        owner: &str,
        repo_name: &str,
        selection: Vec<DetailField>,
    ) -> Result<RepositoryDetails, ScanError> {
        let operation = ScanOperation::ScanRepository { selection };
        let tracker = Arc::new(ScanTracker::new());

        self.admission.admit(&operation, &tracker).await?;

        let listener = FanOutListener::new(
            Arc::clone(&tracker),
            DetailField::ALL.iter().map(|field| field.name()),
        );

        let result = self
            .service
            .scan_repository(token, owner, repo_name, operation.selection(), &listener)
            .await;

        tracker.finish();
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use repo_scanner_gate::ScanGate;
    use repo_scanner_testing::MockGitHub;
    use std::num::NonZeroUsize;

    fn executor(github: MockGitHub, capacity: usize) -> (ScanExecutor<MockGitHub>, Arc<ScanGate>) {
        let gate = Arc::new(ScanGate::new(NonZeroUsize::new(capacity).unwrap()));
        let executor = ScanExecutor::new(
            RepositoryService::new(Arc::new(github)),
            AdmissionController::new(Arc::clone(&gate)),
        );
        (executor, gate)
    }

    #[tokio::test]
    async fn test_listing_never_touches_the_gate() {
        let github = MockGitHub::new().with_repository("acme", "widget");
        let (executor, gate) = executor(github, 1);

        let blocker = gate.try_acquire();
        assert!(blocker.is_some(), "gate should start free");

        // With the only slot held, an ungated listing still goes through
        let repos = executor.list_repositories("t0k3n").await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(gate.available(), 0);
    }

    #[tokio::test]
    async fn test_scan_releases_slot_on_success() {
        let github = MockGitHub::new().with_repository("acme", "widget");
        let (executor, gate) = executor(github, 1);

        let details = executor
            .scan_repository("t0k3n", "acme", "widget", DetailField::ALL.to_vec())
            .await
            .unwrap();

        assert_eq!(details.name, "widget");
        assert_eq!(gate.available(), 1, "slot must be back after the scan");
    }

    #[tokio::test]
    async fn test_scan_releases_slot_when_base_fetch_fails() {
        let github = MockGitHub::new(); // no repositories scripted -> 404
        let (executor, gate) = executor(github, 1);

        let result = executor
            .scan_repository("t0k3n", "acme", "ghost", DetailField::ALL.to_vec())
            .await;

        assert!(result.is_err());
        assert_eq!(gate.available(), 1, "slot must be back after a failed scan");
    }

    #[tokio::test]
    async fn test_scan_with_empty_selection_relies_on_safety_net() {
        let github = MockGitHub::new().with_repository("acme", "widget");
        let (executor, gate) = executor(github, 1);

        let details = executor
            .scan_repository("t0k3n", "acme", "widget", Vec::new())
            .await
            .unwrap();

        assert_eq!(details.number_of_files, None);
        assert_eq!(details.active_webhooks, None);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_validation_failure_after_admission_still_releases() {
        let github = MockGitHub::new();
        let (executor, gate) = executor(github, 1);

        let result = executor
            .scan_repository("t0k3n", "acme", "../escape", DetailField::ALL.to_vec())
            .await;

        assert!(matches!(result, Err(ScanError::Validation { .. })));
        assert_eq!(gate.available(), 1);
    }
}
