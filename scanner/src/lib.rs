//! # Repo Scanner Service
//!
//! Domain layer of the repo scanner: the repository listing and the gated
//! repository scan, executed against the GitHub boundary with fan-out
//! completion tracking.
//!
//! A scan resolves up to three detail fields concurrently (file count,
//! first YAML file content, active webhooks) while the request holds one
//! slot of the process-wide scan gate. The [`ScanExecutor`] wires admission
//! and the safety net around the [`RepositoryService`]; the service itself
//! only fetches and assembles.

pub mod error;
pub mod executor;
pub mod model;
pub mod operation;
pub mod service;

// Re-export key types for convenience
pub use error::ScanError;
pub use executor::ScanExecutor;
pub use model::{Repository, RepositoryDetails, Webhook};
pub use operation::{DetailField, ScanOperation};
pub use service::RepositoryService;
