//! End-to-end API tests over the full stack with a scripted GitHub mock.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum_test::TestServer;
use repo_scanner_gate::{AdmissionController, ScanGate};
use repo_scanner_github::GitHubApi;
use repo_scanner_scanner::{RepositoryService, ScanExecutor};
use repo_scanner_testing::{MockGitHub, fixtures};
use repo_scanner_web::{AppState, CORRELATION_ID_HEADER, app};
use serde_json::{Value, json};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

struct TestStack {
    server: TestServer,
    gate: Arc<ScanGate>,
    github: Arc<MockGitHub>,
}

fn stack(github: MockGitHub, capacity: usize, admission_timeout: Option<Duration>) -> TestStack {
    let github = Arc::new(github);
    let gate = Arc::new(ScanGate::new(NonZeroUsize::new(capacity).unwrap()));

    let mut admission = AdmissionController::new(Arc::clone(&gate));
    if let Some(wait) = admission_timeout {
        admission = admission.with_acquire_timeout(wait);
    }

    let service =
        RepositoryService::new(Arc::clone(&github) as Arc<dyn GitHubApi>);
    let executor = Arc::new(ScanExecutor::new(service, admission));
    let server = TestServer::new(app(AppState::new(executor))).unwrap();

    TestStack { server, gate, github }
}

fn scripted_github() -> MockGitHub {
    MockGitHub::new()
        .with_repository("acme", "widget")
        .with_tree(
            "acme",
            "widget",
            "main",
            fixtures::tree(&["README.md", "deploy.yaml", "src/lib.rs"]),
        )
        .with_content("acme", "widget", fixtures::content("deploy.yaml", "replicas: 3\n"))
        .with_webhooks(
            "acme",
            "widget",
            vec![
                fixtures::webhook(1, true, "https://ci.example.com/hook"),
                fixtures::webhook(2, false, "https://old.example.com/hook"),
            ],
        )
}

fn bearer() -> HeaderValue {
    HeaderValue::from_static("Bearer valid-token")
}

#[tokio::test]
async fn test_health_endpoint() {
    let stack = stack(MockGitHub::new(), 1, None);

    let response = stack.server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn test_gate_health_reports_capacity() {
    let stack = stack(MockGitHub::new(), 3, None);

    let body: Value = stack.server.get("/health/gate").await.json();

    assert_eq!(body["capacity"], 3);
    assert_eq!(body["available"], 3);
}

#[tokio::test]
async fn test_list_requires_bearer_token() {
    let stack = stack(scripted_github(), 1, None);

    let response = stack.server.get("/api/v1/repositories").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_list_repositories() {
    let stack = stack(scripted_github(), 1, None);

    let response = stack
        .server
        .get("/api/v1/repositories")
        .add_header(header::AUTHORIZATION, bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!([{"name": "widget", "size": 2048, "owner": "acme"}]));
}

#[tokio::test]
async fn test_scan_returns_all_fields_by_default() {
    let stack = stack(scripted_github(), 1, None);

    let response = stack
        .server
        .post("/api/v1/repositories/acme/widget/scan")
        .add_header(header::AUTHORIZATION, bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "widget");
    assert_eq!(body["isPrivate"], false);
    assert_eq!(body["numberOfFiles"], 3);
    assert_eq!(body["contentOfOneYamlFile"], "replicas: 3\n");
    assert_eq!(body["activeWebhooks"], json!([{
        "id": 1,
        "name": "web",
        "active": true,
        "url": "https://ci.example.com/hook",
        "events": ["push"]
    }]));

    // The slot is back before the response reaches the client
    assert_eq!(stack.gate.available(), 1);
}

#[tokio::test]
async fn test_scan_honors_field_selection() {
    let stack = stack(scripted_github(), 1, None);

    let response = stack
        .server
        .post("/api/v1/repositories/acme/widget/scan")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({"fields": ["activeWebhooks"]}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.get("numberOfFiles"), None);
    assert_eq!(body.get("contentOfOneYamlFile"), None);
    assert_eq!(body["activeWebhooks"][0]["id"], 1);

    // Unselected fields were never fetched upstream
    let calls = stack.github.calls();
    assert!(!calls.iter().any(|c| c.contains("/git/trees/")));
}

#[tokio::test]
async fn test_scan_with_empty_selection_still_round_trips_the_gate() {
    let stack = stack(scripted_github(), 1, None);

    let response = stack
        .server
        .post("/api/v1/repositories/acme/widget/scan")
        .add_header(header::AUTHORIZATION, bearer())
        .json(&json!({"fields": []}))
        .await;

    response.assert_status_ok();
    assert_eq!(stack.gate.available(), 1);
}

#[tokio::test]
async fn test_scan_unknown_repository_is_not_found() {
    let stack = stack(scripted_github(), 1, None);

    let response = stack
        .server
        .post("/api/v1/repositories/acme/ghost/scan")
        .add_header(header::AUTHORIZATION, bearer())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(stack.gate.available(), 1);
}

#[tokio::test]
async fn test_scan_invalid_repository_name_is_bad_request() {
    let stack = stack(scripted_github(), 1, None);

    let response = stack
        .server
        .post("/api/v1/repositories/acme/bad!name/scan")
        .add_header(header::AUTHORIZATION, bearer())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(stack.gate.available(), 1);
}

#[tokio::test]
async fn test_rejected_token_maps_to_unauthenticated() {
    let stack = stack(scripted_github().with_valid_token("good"), 1, None);

    let response = stack
        .server
        .get("/api/v1/repositories")
        .add_header(header::AUTHORIZATION, bearer()) // "valid-token" is not "good"
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_sequential_scans_reuse_the_single_slot() {
    let stack = stack(scripted_github(), 1, None);

    for _ in 0..3 {
        let response = stack
            .server
            .post("/api/v1/repositories/acme/widget/scan")
            .add_header(header::AUTHORIZATION, bearer())
            .await;
        response.assert_status_ok();
    }

    assert_eq!(stack.gate.available(), 1);
}

#[tokio::test]
async fn test_admission_timeout_surfaces_as_service_unavailable() {
    let stack = stack(
        scripted_github().with_latency(Duration::from_millis(80)),
        1,
        Some(Duration::from_millis(10)),
    );

    let first = stack
        .server
        .post("/api/v1/repositories/acme/widget/scan")
        .add_header(header::AUTHORIZATION, bearer());
    let second = stack
        .server
        .post("/api/v1/repositories/acme/widget/scan")
        .add_header(header::AUTHORIZATION, bearer());

    let (first, second) = tokio::join!(async { first.await }, async { second.await });

    let mut statuses = [first.status_code().as_u16(), second.status_code().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 503], "one scan runs, the other times out at admission");

    let rejected = if first.status_code().as_u16() == 503 { first } else { second };
    let body: Value = rejected.json();
    assert_eq!(body["code"], "SCAN_ADMISSION_TIMEOUT");

    // The timed-out waiter left no phantom state behind
    assert_eq!(stack.gate.available(), 1);
}

#[tokio::test]
async fn test_correlation_id_echoed() {
    let stack = stack(MockGitHub::new(), 1, None);

    let response = stack
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-correlation-id"),
            HeaderValue::from_static("6f9619ff-8b86-d011-b42d-00c04fc964ff"),
        )
        .await;

    assert_eq!(
        response.headers().get(CORRELATION_ID_HEADER).unwrap(),
        "6f9619ff-8b86-d011-b42d-00c04fc964ff"
    );
}
