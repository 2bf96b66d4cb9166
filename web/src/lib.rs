//! Axum HTTP surface for the repo scanner.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            HTTP shell (Axum)            │  ← auth header, JSON, errors
//! │  - BearerToken extraction               │  ← correlation IDs, tracing
//! │  - error-to-response mapping            │
//! ├─────────────────────────────────────────┤
//! │            Scan execution               │
//! │  - admission gate (bounded scans)       │  ← suspends while full
//! │  - fan-out completion tracking          │  ← slot released exactly once
//! │  - GitHub fetches                       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP request** arrives at an Axum handler
//! 2. **Extract** the bearer token and path/body arguments
//! 3. **Admit** the operation (gated scans may suspend here)
//! 4. **Execute** the fetches, fan-out fields concurrently
//! 5. **Map result** to a JSON response or a `{ code, message }` error

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

// Re-export key types for convenience
pub use config::{ConfigError, ServerConfig};
pub use error::AppError;
pub use extractors::BearerToken;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

/// Build the application router.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/gate", get(handlers::gate_health))
        .route("/api/v1/repositories", get(handlers::list_repositories))
        .route(
            "/api/v1/repositories/:owner/:repo/scan",
            post(handlers::scan_repository),
        )
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
