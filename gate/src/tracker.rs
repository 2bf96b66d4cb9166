//! Per-request scan state: slot ownership and fan-out completion tracking.
//!
//! A [`ScanTracker`] is created fresh for every incoming request and discarded
//! at request end; it is never shared across requests. It owns two things:
//!
//! - the request's gate slot, as a tagged state machine
//!   (`Idle` → `Held` → `Released`) whose release consumes the held permit,
//!   so releasing twice is unrepresentable;
//! - a table mapping each scanned entity's key to the number of its tracked
//!   sub-fields still in flight. When an entity's counter returns to zero the
//!   slot is released.
//!
//! [`ScanTracker::finish`] is the safety net: it runs when the response is
//! about to be produced and force-releases anything still held, so a slot can
//! never leak past its request. Dropping the tracker does the same as a
//! backstop for abnormal termination.

use crate::semaphore::ScanPermit;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Ownership state of the request's gate slot.
///
/// Release moves `Held` to `Released`, consuming the permit. A second
/// zero-crossing (or the safety net running after a normal release) finds
/// `Released` and does nothing.
#[derive(Debug, Default)]
enum SlotState {
    /// No slot was acquired for this request (ungated, or not yet admitted).
    #[default]
    Idle,
    /// The request holds a slot.
    Held(ScanPermit),
    /// The slot was held and has been returned.
    Released,
}

/// Pending-field counter for one entity undergoing a scan.
#[derive(Debug)]
struct TrackingEntry {
    /// Tracked sub-fields of this entity currently in flight.
    pending_fields: usize,
    /// Diagnostic correlation token; not used for logic.
    session_id: Uuid,
}

#[derive(Debug, Default)]
struct TrackerInner {
    slot: SlotState,
    session_id: Option<Uuid>,
    tracking: HashMap<String, TrackingEntry>,
}

impl TrackerInner {
    /// Release the slot if it is still held. Idle stays idle: a zero-crossing
    /// on a request that never acquired must not invent a release.
    fn release_slot(&mut self) -> bool {
        match std::mem::take(&mut self.slot) {
            SlotState::Held(permit) => {
                drop(permit);
                self.slot = SlotState::Released;
                true
            }
            other => {
                self.slot = other;
                false
            }
        }
    }
}

/// Request-scoped scan tracking state.
///
/// All mutation goes through short synchronous critical sections guarded by a
/// mutex, safe under arbitrary interleaving of the request's concurrently
/// resolving fields. See the module docs for the lifecycle.
#[derive(Debug, Default)]
pub struct ScanTracker {
    inner: Mutex<TrackerInner>,
}

impl ScanTracker {
    /// Create an empty tracker for a new request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the slot acquired for this request.
    ///
    /// Called at most once per request by the admission controller. If a slot
    /// is already held or was already released, the incoming permit is
    /// dropped immediately (returned to the gate) rather than stacked.
    pub fn admit(&self, permit: ScanPermit, session_id: Uuid) {
        let mut inner = self.lock();
        match inner.slot {
            SlotState::Idle => {
                inner.slot = SlotState::Held(permit);
                inner.session_id = Some(session_id);
            }
            SlotState::Held(_) | SlotState::Released => {
                tracing::warn!(
                    session_id = %session_id,
                    "duplicate scan admission for one request, returning extra slot"
                );
                drop(permit);
            }
        }
    }

    /// Whether this request has gone through admission (slot held or already
    /// released). Used to keep acquisition per-request, not per-field.
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        !matches!(self.lock().slot, SlotState::Idle)
    }

    /// Whether the request currently holds a slot.
    #[must_use]
    pub fn holds_slot(&self) -> bool {
        matches!(self.lock().slot, SlotState::Held(_))
    }

    /// Record that a tracked sub-field of `key` started resolving.
    pub(crate) fn field_started(&self, key: &str, field: &str) {
        let mut inner = self.lock();
        let entry = inner
            .tracking
            .entry(key.to_owned())
            .or_insert_with(|| TrackingEntry {
                pending_fields: 0,
                session_id: Uuid::new_v4(),
            });
        entry.pending_fields += 1;

        tracing::debug!(
            session_id = %entry.session_id,
            entity = key,
            field,
            pending_fields = entry.pending_fields,
            "tracked field started"
        );
    }

    /// Record that a tracked sub-field of `key` finished resolving, whether
    /// it succeeded or failed. When the entity's last pending field finishes,
    /// the slot is released and the entry removed.
    pub(crate) fn field_finished(&self, key: &str, field: &str, failed: bool) {
        let mut inner = self.lock();
        let Some(entry) = inner.tracking.get_mut(key) else {
            tracing::debug!(entity = key, field, "finish event for untracked entity, ignoring");
            return;
        };

        entry.pending_fields = entry.pending_fields.saturating_sub(1);
        let session_id = entry.session_id;
        let pending = entry.pending_fields;

        tracing::debug!(
            session_id = %session_id,
            entity = key,
            field,
            pending_fields = pending,
            failed,
            "tracked field finished"
        );

        if pending == 0 {
            inner.tracking.remove(key);
            if inner.release_slot() {
                tracing::info!(
                    session_id = %session_id,
                    entity = key,
                    "scan complete, slot released"
                );
            }
        }
    }

    /// Safety net, run unconditionally before the response is produced.
    ///
    /// Force-releases the slot if it is still held and clears any tracking
    /// entries whose finish events never arrived. Idempotent; after a normal
    /// zero-crossing release this is a no-op.
    pub fn finish(&self) {
        let mut inner = self.lock();

        if inner.release_slot() {
            tracing::warn!(
                session_id = ?inner.session_id,
                "safety net released a scan slot not freed by field tracking"
            );
        }

        for (key, entry) in inner.tracking.drain() {
            tracing::warn!(
                session_id = %entry.session_id,
                entity = %key,
                pending_fields = entry.pending_fields,
                "clearing unfinished scan tracking entry"
            );
        }
    }
}

impl Drop for ScanTracker {
    // Backstop for requests torn down without reaching finish(): the permit
    // inside SlotState::Held is dropped with the tracker, returning the slot.
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(inner.slot, SlotState::Held(_)) {
            tracing::warn!(
                session_id = ?inner.session_id,
                "scan tracker dropped while still holding a slot"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::semaphore::ScanGate;
    use std::num::NonZeroUsize;
    use std::sync::Arc;

    fn gate(capacity: usize) -> Arc<ScanGate> {
        Arc::new(ScanGate::new(NonZeroUsize::new(capacity).unwrap()))
    }

    async fn admitted_tracker(gate: &Arc<ScanGate>) -> ScanTracker {
        let tracker = ScanTracker::new();
        let permit = gate.acquire().await.unwrap();
        tracker.admit(permit, Uuid::new_v4());
        tracker
    }

    #[tokio::test]
    async fn test_release_fires_after_last_field_regardless_of_order() {
        // Every arrival order of three field completions, with one failure
        let orders: [[&str; 3]; 3] = [
            ["webhooks", "files", "yaml"],
            ["yaml", "webhooks", "files"],
            ["files", "yaml", "webhooks"],
        ];

        for order in orders {
            let gate = gate(1);
            let tracker = admitted_tracker(&gate).await;

            for field in order {
                tracker.field_started("acme/widget", field);
            }
            assert_eq!(gate.available(), 0);

            for (i, field) in order.iter().enumerate() {
                tracker.field_finished("acme/widget", field, *field == "yaml");
                if i < 2 {
                    assert_eq!(gate.available(), 0, "released before last field");
                } else {
                    assert_eq!(gate.available(), 1, "not released after last field");
                }
            }
        }
    }

    #[tokio::test]
    async fn test_release_is_exactly_once() {
        let gate = gate(1);
        let tracker = admitted_tracker(&gate).await;

        tracker.field_started("acme/widget", "files");
        tracker.field_finished("acme/widget", "files", false);
        assert_eq!(gate.available(), 1);

        // Safety net after a normal release must not release again
        tracker.finish();
        assert_eq!(gate.available(), 1);

        // Stray finish events after the entry is gone are ignored
        tracker.field_finished("acme/widget", "files", false);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_safety_net_releases_when_no_fields_tracked() {
        let gate = gate(1);
        let tracker = admitted_tracker(&gate).await;
        assert_eq!(gate.available(), 0);

        // Gated operation that selected none of the tracked sub-fields
        tracker.finish();
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_safety_net_frees_slot_when_finish_events_never_arrive() {
        let gate = gate(1);
        let tracker = admitted_tracker(&gate).await;

        tracker.field_started("acme/widget", "files");
        tracker.field_started("acme/widget", "webhooks");
        // Simulated dropped callbacks: no field_finished at all
        tracker.finish();

        assert_eq!(gate.available(), 1);
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_drop_backstop_returns_held_slot() {
        let gate = gate(1);
        {
            let tracker = admitted_tracker(&gate).await;
            tracker.field_started("acme/widget", "files");
            // Request torn down early: neither finish events nor finish()
            drop(tracker);
        }
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_zero_crossing_without_admission_releases_nothing() {
        let gate = gate(1);
        let tracker = ScanTracker::new();

        tracker.field_started("acme/widget", "files");
        tracker.field_finished("acme/widget", "files", false);
        tracker.finish();

        assert!(!tracker.is_admitted());
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_independent_entities_first_zero_crossing_releases() {
        let gate = gate(1);
        let tracker = admitted_tracker(&gate).await;

        tracker.field_started("acme/widget", "files");
        tracker.field_started("acme/gadget", "files");

        tracker.field_finished("acme/widget", "files", false);
        // First entity done: the request-level slot is released
        assert_eq!(gate.available(), 1);

        // Second entity finishing is a no-op on the slot
        tracker.field_finished("acme/gadget", "files", false);
        assert_eq!(gate.available(), 1);
        tracker.finish();
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_admission_returns_extra_permit() {
        let gate = gate(2);
        let tracker = admitted_tracker(&gate).await;
        assert_eq!(gate.available(), 1);

        let extra = gate.acquire().await.unwrap();
        tracker.admit(extra, Uuid::new_v4());
        // The duplicate permit went straight back to the gate
        assert_eq!(gate.available(), 1);
        assert!(tracker.holds_slot());

        tracker.finish();
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_interleaved_counters_per_entity() {
        let gate = gate(1);
        let tracker = admitted_tracker(&gate).await;

        tracker.field_started("acme/widget", "files");
        tracker.field_started("acme/widget", "webhooks");
        tracker.field_started("acme/widget", "yaml");

        tracker.field_finished("acme/widget", "webhooks", true);
        tracker.field_finished("acme/widget", "files", false);
        assert!(tracker.holds_slot());

        tracker.field_finished("acme/widget", "yaml", false);
        assert!(!tracker.holds_slot());
        assert!(tracker.is_admitted());
        assert_eq!(gate.available(), 1);
    }
}
