//! HTTP request handlers.

pub mod health;
pub mod repositories;

pub use health::{gate_health, health_check};
pub use repositories::{list_repositories, scan_repository};
