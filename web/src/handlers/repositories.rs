//! Repository listing and scan endpoints.

use crate::error::AppError;
use crate::extractors::BearerToken;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use repo_scanner_scanner::{DetailField, Repository, RepositoryDetails};
use serde::Deserialize;

/// List the token user's repositories.
///
/// Runs ungated; listing is a single upstream call.
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/repositories
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// 401 for a missing or rejected token, upstream errors per their status.
pub async fn list_repositories(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Vec<Repository>>, AppError> {
    let repositories = state.executor().list_repositories(&token).await?;
    Ok(Json(repositories))
}

/// Scan request body; omitting it (or `fields`) selects every detail field.
#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    /// Detail fields to resolve.
    #[serde(default)]
    pub fields: Option<Vec<DetailField>>,
}

/// Scan one repository.
///
/// Gated: the request suspends until a scan slot is free, then resolves the
/// selected detail fields concurrently.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/repositories/{owner}/{repo}/scan
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "fields": ["numberOfFiles", "activeWebhooks"] }
/// ```
///
/// # Errors
///
/// 400 for malformed owner/repo names, 401 for a missing or rejected token,
/// 404 for an unknown repository, 503 when a configured admission wait
/// elapses.
pub async fn scan_repository(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path((owner, repo)): Path<(String, String)>,
    body: Option<Json<ScanRequest>>,
) -> Result<Json<RepositoryDetails>, AppError> {
    let selection = body
        .and_then(|Json(request)| request.fields)
        .unwrap_or_else(|| DetailField::ALL.to_vec());

    let details = state
        .executor()
        .scan_repository(&token, &owner, &repo, selection)
        .await?;
    Ok(Json(details))
}
