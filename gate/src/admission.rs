//! Admission decision for incoming operations.
//!
//! The controller inspects each request's operation exactly once. Operations
//! selecting the gated scan entry point suspend until the [`ScanGate`] grants
//! a slot; everything else passes through untouched. Acquisition is
//! per-request: a second gated entry point in the same request reuses the
//! slot already held.

use crate::semaphore::{AdmissionError, ScanGate};
use crate::tracker::ScanTracker;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Operation-inspector boundary.
///
/// Implemented by the request layer's operation type; the gate core only
/// needs to know whether the gated entry point was selected.
pub trait GatedOperation {
    /// Whether executing this operation requires a scan slot.
    fn requires_scan_slot(&self) -> bool;
}

/// Outcome of an admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The operation does not touch the gated entry point.
    Ungated,
    /// A slot was acquired and handed to the request's tracker.
    Admitted,
    /// The request already went through admission; no second acquire.
    AlreadyAdmitted,
}

/// Decides, once per request, whether a gate slot is required and acquires it
/// before any field execution starts.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    gate: Arc<ScanGate>,
    acquire_timeout: Option<Duration>,
}

impl AdmissionController {
    /// Controller over a shared gate, waiting indefinitely for a slot.
    #[must_use]
    pub const fn new(gate: Arc<ScanGate>) -> Self {
        Self {
            gate,
            acquire_timeout: None,
        }
    }

    /// Bound the wait for a slot. Timed-out admissions surface as
    /// [`AdmissionError::Timeout`], distinct from any data-fetch error.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, wait: Duration) -> Self {
        self.acquire_timeout = Some(wait);
        self
    }

    /// The gate this controller admits against.
    #[must_use]
    pub const fn gate(&self) -> &Arc<ScanGate> {
        &self.gate
    }

    /// Run the admission decision for `operation`.
    ///
    /// Suspends until a slot is free when the operation is gated. The
    /// acquired slot is stored in `tracker`, which owns its release.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Timeout`] when a bounded wait is configured
    /// and elapses before a slot frees.
    pub async fn admit<O: GatedOperation>(
        &self,
        operation: &O,
        tracker: &ScanTracker,
    ) -> Result<Admission, AdmissionError> {
        if !operation.requires_scan_slot() {
            return Ok(Admission::Ungated);
        }

        if tracker.is_admitted() {
            return Ok(Admission::AlreadyAdmitted);
        }

        let session_id = Uuid::new_v4();
        tracing::info!(
            session_id = %session_id,
            available = self.gate.available(),
            "scan admission queued"
        );

        let permit = match self.acquire_timeout {
            Some(wait) => self.gate.acquire_timeout(wait).await?,
            None => self.gate.acquire().await?,
        };

        tracing::info!(session_id = %session_id, "scan slot acquired");
        tracker.admit(permit, session_id);
        Ok(Admission::Admitted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    struct Op(bool);

    impl GatedOperation for Op {
        fn requires_scan_slot(&self) -> bool {
            self.0
        }
    }

    fn controller(capacity: usize) -> AdmissionController {
        AdmissionController::new(Arc::new(ScanGate::new(
            NonZeroUsize::new(capacity).unwrap(),
        )))
    }

    #[tokio::test]
    async fn test_ungated_operation_never_acquires() {
        let controller = controller(1);
        let tracker = ScanTracker::new();

        let admission = controller.admit(&Op(false), &tracker).await.unwrap();

        assert_eq!(admission, Admission::Ungated);
        assert!(!tracker.is_admitted());
        assert_eq!(controller.gate().available(), 1);
    }

    #[tokio::test]
    async fn test_gated_operation_acquires_once() {
        let controller = controller(2);
        let tracker = ScanTracker::new();

        let first = controller.admit(&Op(true), &tracker).await.unwrap();
        assert_eq!(first, Admission::Admitted);
        assert_eq!(controller.gate().available(), 1);

        // Second gated entry point in the same request
        let second = controller.admit(&Op(true), &tracker).await.unwrap();
        assert_eq!(second, Admission::AlreadyAdmitted);
        assert_eq!(controller.gate().available(), 1);

        tracker.finish();
        assert_eq!(controller.gate().available(), 2);
    }

    #[tokio::test]
    async fn test_bounded_wait_times_out_distinctly() {
        let controller = controller(1).with_acquire_timeout(Duration::from_millis(20));

        let holding = ScanTracker::new();
        controller.admit(&Op(true), &holding).await.unwrap();

        let starved = ScanTracker::new();
        let result = controller.admit(&Op(true), &starved).await;

        assert!(matches!(result, Err(AdmissionError::Timeout { .. })));
        assert!(!starved.is_admitted());

        holding.finish();
        let retry = controller.admit(&Op(true), &starved).await.unwrap();
        assert_eq!(retry, Admission::Admitted);
        starved.finish();
    }

    #[tokio::test]
    async fn test_admission_happens_before_field_tracking() {
        let controller = controller(1);
        let tracker = ScanTracker::new();

        controller.admit(&Op(true), &tracker).await.unwrap();
        assert!(tracker.holds_slot());

        tracker.field_started("acme/widget", "files");
        tracker.field_finished("acme/widget", "files", false);
        assert!(!tracker.holds_slot());
        tracker.finish();
    }
}
