//! # Repo Scanner Gate
//!
//! Bounded-concurrency admission gate with fan-out completion tracking.
//!
//! Repository scans are expensive multi-request operations, so at most a
//! fixed number of them may run at once; the lightweight sub-fetches each
//! scan spawns run without limit. This crate guarantees the admission slot
//! is released exactly once per request regardless of completion order,
//! partial failure, or early termination of the surrounding request.
//!
//! ## Pieces
//!
//! - [`ScanGate`]: FIFO counting semaphore, capacity fixed at startup,
//!   constructed once and shared.
//! - [`AdmissionController`]: decides once per request whether a slot is
//!   needed and acquires it before field execution starts.
//! - [`ScanTracker`]: per-request slot ownership and per-entity pending-field
//!   counters; its `finish` is the safety net that runs before the response
//!   is produced.
//! - [`FanOutListener`]: observes field start/finish events, releasing the
//!   slot when the last tracked field of an entity completes.
//!
//! The crate has no knowledge of what fields compute or how requests are
//! transported; entities and fields are opaque strings supplied by the
//! execution layer.
//!
//! ## Control flow
//!
//! ```text
//! request arrives
//!   └─ AdmissionController::admit      (suspends if the gate is full)
//!        └─ field execution fans out, FanOutListener counting per entity
//!             └─ last tracked field finishes → slot released
//!   └─ ScanTracker::finish             (safety net, always runs)
//! ```

pub mod admission;
pub mod listener;
pub mod semaphore;
pub mod tracker;

// Re-export key types for convenience
pub use admission::{Admission, AdmissionController, GatedOperation};
pub use listener::FanOutListener;
pub use semaphore::{AdmissionError, ScanGate, ScanPermit};
pub use tracker::ScanTracker;
