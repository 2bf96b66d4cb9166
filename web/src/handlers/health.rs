//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running. Does NOT check the
/// GitHub upstream.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Scan gate occupancy.
#[derive(Debug, Serialize)]
pub struct GateHealth {
    /// Fixed gate capacity.
    pub capacity: usize,
    /// Slots currently free.
    pub available: usize,
}

/// Gate diagnostics: how many scan slots exist and how many are free.
///
/// # Endpoint
///
/// ```text
/// GET /health/gate
/// ```
///
/// # Response
///
/// ```json
/// {
///   "capacity": 2,
///   "available": 1
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn gate_health(State(state): State<AppState>) -> Json<GateHealth> {
    let gate = state.executor().admission().gate();
    Json(GateHealth {
        capacity: gate.capacity(),
        available: gate.available(),
    })
}
