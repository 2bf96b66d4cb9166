//! Counting gate bounding concurrent repository scans.
//!
//! A scan is a multi-request operation against the GitHub API, so the number
//! of scans allowed to run at once is fixed at startup. Sub-fetches spawned
//! by an admitted scan are not throttled here; only admission is.
//!
//! # Example
//!
//! ```
//! use repo_scanner_gate::ScanGate;
//! use std::num::NonZeroUsize;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gate = ScanGate::new(NonZeroUsize::new(2).ok_or("capacity")?);
//!
//! let permit = gate.acquire().await?;
//! // ... run the scan ...
//! drop(permit); // slot returns to the gate, earliest waiter wakes
//! # Ok(())
//! # }
//! ```

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Errors from the admission path.
///
/// The gate itself never fails an admitted caller; it only suspends. These
/// variants exist for the hardened bounded-wait path and for the semaphore
/// API surface.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The gate's semaphore was closed. Unreachable while the gate is alive;
    /// kept so acquisition failures propagate instead of panicking.
    #[error("scan gate is closed")]
    Closed,

    /// Bounded wait elapsed before a slot freed up.
    ///
    /// Distinct from any data-fetch error so callers can surface admission
    /// pressure separately from upstream failures.
    #[error("timed out after {waited:?} waiting for a scan slot")]
    Timeout {
        /// How long the caller waited before giving up.
        waited: Duration,
    },
}

/// Process-wide gate limiting concurrent scans.
///
/// Capacity is fixed at construction and never reconfigured. Waiters are
/// woken in FIFO arrival order (the underlying tokio semaphore is fair), and
/// a slot is only ever returned by dropping its [`ScanPermit`], so holding
/// more than `capacity` slots is impossible by construction.
///
/// Construct one gate at startup and share it via `Arc`; per-call gates
/// would defeat the bound.
#[derive(Debug)]
pub struct ScanGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ScanGate {
    /// Create a gate with the given capacity.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.get())),
            capacity: capacity.get(),
        }
    }

    /// Acquire a slot, suspending until one is available.
    ///
    /// Waiters are served in arrival order. There is no timeout; a caller
    /// waits as long as it takes for a slot to free.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Closed`] if the semaphore was closed, which
    /// cannot happen while the gate is alive.
    pub async fn acquire(&self) -> Result<ScanPermit, AdmissionError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map(ScanPermit)
            .map_err(|_| AdmissionError::Closed)
    }

    /// Acquire a slot, giving up after `wait`.
    ///
    /// A timed-out caller is fully removed from the waiter queue (its
    /// acquire future is dropped), so no slot is granted to it later.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Timeout`] if no slot freed within `wait`.
    pub async fn acquire_timeout(&self, wait: Duration) -> Result<ScanPermit, AdmissionError> {
        match tokio::time::timeout(wait, self.acquire()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(waited = ?wait, "scan admission timed out");
                Err(AdmissionError::Timeout { waited: wait })
            }
        }
    }

    /// Acquire a slot without waiting; `None` if the gate is full.
    #[must_use]
    pub fn try_acquire(&self) -> Option<ScanPermit> {
        self.semaphore.clone().try_acquire_owned().ok().map(ScanPermit)
    }

    /// Number of slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Fixed capacity of the gate.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// One held unit of the gate's capacity.
///
/// Dropping the permit returns the slot and wakes the earliest waiter.
/// Because the slot is a move-only token, releasing twice is
/// unrepresentable.
#[must_use]
#[derive(Debug)]
pub struct ScanPermit(OwnedSemaphorePermit);
