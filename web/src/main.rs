//! Repo scanner server binary.
//!
//! Reads configuration from the environment, constructs the GitHub client,
//! the process-wide scan gate, and the executor, then serves the HTTP API.

use repo_scanner_gate::{AdmissionController, ScanGate};
use repo_scanner_github::{GitHubApi, GitHubClient};
use repo_scanner_scanner::{RepositoryService, ScanExecutor};
use repo_scanner_web::{AppState, ServerConfig, app};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env()?;

    let github = GitHubClient::new(&config.github_base_url, config.request_timeout)?;

    // One gate for the life of the process; capacity is fixed here
    let gate = Arc::new(ScanGate::new(config.max_concurrent_scans));
    let mut admission = AdmissionController::new(Arc::clone(&gate));
    if let Some(wait) = config.admission_timeout {
        admission = admission.with_acquire_timeout(wait);
    }

    let service = RepositoryService::new(Arc::new(github) as Arc<dyn GitHubApi>);
    let executor = Arc::new(ScanExecutor::new(service, admission));

    let router = app(AppState::new(executor));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(
        port = config.port,
        max_concurrent_scans = config.max_concurrent_scans.get(),
        github_base_url = %config.github_base_url,
        "repo scanner listening"
    );

    axum::serve(listener, router).await?;
    Ok(())
}
