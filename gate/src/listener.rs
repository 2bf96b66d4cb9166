//! Fan-out listener observing tracked field resolutions.
//!
//! The listener sits between the execution layer and the request's
//! [`ScanTracker`]: it filters field events down to the tracked set, forms no
//! opinion about what the fields compute, and forwards start/finish pairs to
//! the tracker's per-entity counters. Fields outside the tracked set, and
//! fields whose entity has no key, are skipped entirely.
//!
//! One request may fan out over several entities at once; each entity counts
//! down independently. The gate slot is per-request, so only the first
//! entity's zero-crossing actually releases it; later crossings find the
//! slot already released and do nothing (remaining state is swept by the
//! safety net at request end).

use crate::tracker::ScanTracker;
use std::collections::HashSet;
use std::sync::Arc;

/// Observes the start and end of every field resolution for one request.
#[derive(Debug)]
pub struct FanOutListener {
    tracker: Arc<ScanTracker>,
    tracked_fields: HashSet<String>,
}

impl FanOutListener {
    /// Listener over the request's tracker, observing `tracked_fields`.
    pub fn new<I, S>(tracker: Arc<ScanTracker>, tracked_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracker,
            tracked_fields: tracked_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The tracker this listener feeds.
    #[must_use]
    pub const fn tracker(&self) -> &Arc<ScanTracker> {
        &self.tracker
    }

    fn tracks(&self, field: &str, entity: Option<&str>) -> bool {
        entity.is_some() && self.tracked_fields.contains(field)
    }

    /// Field resolution is about to start. No-op unless the field is tracked
    /// and the entity has a key.
    pub fn field_started(&self, field: &str, entity: Option<&str>) {
        if let Some(key) = entity {
            if self.tracked_fields.contains(field) {
                self.tracker.field_started(key, field);
            }
        }
    }

    /// Field resolution completed, successfully or not. Errors decrement the
    /// pending counter exactly like successes.
    pub fn field_finished(&self, field: &str, entity: Option<&str>, failed: bool) {
        if let Some(key) = entity {
            if self.tracked_fields.contains(field) {
                self.tracker.field_finished(key, field, failed);
            }
        }
    }

    /// Resolve `fut` under observation: the start event fires before the
    /// future is polled and the finish event fires on both the success and
    /// the error path.
    ///
    /// If the future is cancelled mid-flight the finish event never fires;
    /// the safety net at request end covers that case.
    ///
    /// # Errors
    ///
    /// Returns whatever `fut` returns; the listener never swallows or
    /// rethrows resolution errors, it only observes their timing.
    pub async fn observe<F, T, E>(
        &self,
        field: &str,
        entity: Option<&str>,
        fut: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        if !self.tracks(field, entity) {
            return fut.await;
        }

        self.field_started(field, entity);
        let result = fut.await;
        self.field_finished(field, entity, result.is_err());
        result
    }
}
