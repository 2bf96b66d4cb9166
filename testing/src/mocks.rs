//! Scripted GitHub mock for service and end-to-end tests.

use async_trait::async_trait;
use repo_scanner_github::{
    ContentResponse, GitHubApi, GitHubError, RepositoryResponse, TreeResponse, WebhookResponse,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Builders for GitHub wire-type test data.
pub mod fixtures {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use repo_scanner_github::{
        ContentResponse, OwnerResponse, RepositoryResponse, TreeItem, TreeItemKind, TreeResponse,
        WebhookConfig, WebhookResponse,
    };

    /// A public repository with `main` as default branch.
    #[must_use]
    pub fn repository(owner: &str, name: &str) -> RepositoryResponse {
        RepositoryResponse {
            id: 1,
            name: name.to_owned(),
            full_name: format!("{owner}/{name}"),
            is_private: false,
            owner: OwnerResponse {
                login: owner.to_owned(),
                id: 42,
            },
            size: 2048,
            default_branch: "main".to_owned(),
        }
    }

    /// A tree of blobs at the given paths.
    #[must_use]
    pub fn tree(paths: &[&str]) -> TreeResponse {
        TreeResponse {
            sha: "tree-sha".to_owned(),
            url: String::new(),
            tree: paths
                .iter()
                .map(|path| TreeItem {
                    path: (*path).to_owned(),
                    mode: "100644".to_owned(),
                    kind: TreeItemKind::Blob,
                    sha: "blob-sha".to_owned(),
                    size: Some(64),
                    url: String::new(),
                })
                .collect(),
            truncated: false,
        }
    }

    /// File content carrying `text` base64-encoded, as GitHub serves it.
    #[must_use]
    pub fn content(path: &str, text: &str) -> ContentResponse {
        ContentResponse {
            name: path.rsplit('/').next().unwrap_or(path).to_owned(),
            path: path.to_owned(),
            sha: "content-sha".to_owned(),
            size: text.len() as u64,
            content: BASE64.encode(text),
            encoding: "base64".to_owned(),
        }
    }

    /// A webhook delivering to `url`.
    #[must_use]
    pub fn webhook(id: u64, active: bool, url: &str) -> WebhookResponse {
        WebhookResponse {
            id,
            name: "web".to_owned(),
            active,
            events: vec!["push".to_owned()],
            config: WebhookConfig {
                url: Some(url.to_owned()),
                content_type: Some("json".to_owned()),
            },
        }
    }
}

#[derive(Debug, Default)]
struct Gauge {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(current, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted, in-memory GitHub boundary.
///
/// Everything is registered up front through the builder methods; unknown
/// lookups behave like the real API (404). Each call optionally sleeps for a
/// configured latency so tests can create real overlap, and the mock records
/// how many `get_repository` calls (one per scan) were in flight at once,
/// the observable the capacity-bound tests assert on.
#[derive(Debug, Default)]
pub struct MockGitHub {
    repositories: HashMap<String, RepositoryResponse>,
    trees: HashMap<String, TreeResponse>,
    contents: HashMap<String, ContentResponse>,
    webhooks: HashMap<String, Vec<WebhookResponse>>,
    valid_token: Option<String>,
    latency: Option<Duration>,
    scan_gauge: Gauge,
    calls: Mutex<Vec<String>>,
}

impl MockGitHub {
    /// An empty mock; every lookup is a 404 until scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a public repository (default branch `main`) and include it
    /// in the listing.
    #[must_use]
    pub fn with_repository(self, owner: &str, name: &str) -> Self {
        self.with_repository_response(fixtures::repository(owner, name))
    }

    /// Register a fully specified repository.
    #[must_use]
    pub fn with_repository_response(mut self, repo: RepositoryResponse) -> Self {
        self.repositories.insert(repo.full_name.clone(), repo);
        self
    }

    /// Script the tree served for `branch`.
    #[must_use]
    pub fn with_tree(mut self, owner: &str, name: &str, branch: &str, tree: TreeResponse) -> Self {
        self.trees.insert(format!("{owner}/{name}@{branch}"), tree);
        self
    }

    /// Script the content served for `path`.
    #[must_use]
    pub fn with_content(mut self, owner: &str, name: &str, content: ContentResponse) -> Self {
        self.contents
            .insert(format!("{owner}/{name}:{}", content.path), content);
        self
    }

    /// Script the webhooks of a repository.
    #[must_use]
    pub fn with_webhooks(mut self, owner: &str, name: &str, hooks: Vec<WebhookResponse>) -> Self {
        self.webhooks.insert(format!("{owner}/{name}"), hooks);
        self
    }

    /// Reject every token except `token` with 401.
    #[must_use]
    pub fn with_valid_token(mut self, token: &str) -> Self {
        self.valid_token = Some(token.to_owned());
        self
    }

    /// Sleep this long inside every call, so concurrent requests overlap.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Highest number of `get_repository` calls in flight at once. One scan
    /// performs exactly one such call before fanning out, so this bounds the
    /// number of concurrently admitted scans from below.
    #[must_use]
    pub fn max_concurrent_scans(&self) -> usize {
        self.scan_gauge.max.load(Ordering::SeqCst)
    }

    /// Endpoints called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Wrap the mock in an `Arc<dyn GitHubApi>`.
    #[must_use]
    pub fn into_shared(self) -> std::sync::Arc<dyn GitHubApi> {
        std::sync::Arc::new(self)
    }

    async fn observe_call(&self, endpoint: String, token: &str) -> Result<(), GitHubError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(endpoint);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match &self.valid_token {
            Some(valid) if token != valid => Err(GitHubError::Unauthorized),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl GitHubApi for MockGitHub {
    async fn list_user_repositories(
        &self,
        token: &str,
    ) -> Result<Vec<RepositoryResponse>, GitHubError> {
        self.observe_call("/user/repos".to_owned(), token).await?;
        let mut repos: Vec<_> = self.repositories.values().cloned().collect();
        repos.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(repos)
    }

    async fn get_repository(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryResponse, GitHubError> {
        self.scan_gauge.enter();
        let result = self
            .observe_call(format!("/repos/{owner}/{repo}"), token)
            .await;
        self.scan_gauge.exit();
        result?;

        self.repositories
            .get(&format!("{owner}/{repo}"))
            .cloned()
            .ok_or_else(|| GitHubError::NotFound {
                endpoint: format!("/repos/{owner}/{repo}"),
            })
    }

    async fn get_repository_tree(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<TreeResponse, GitHubError> {
        self.observe_call(format!("/repos/{owner}/{repo}/git/trees/{branch}"), token)
            .await?;

        self.trees
            .get(&format!("{owner}/{repo}@{branch}"))
            .cloned()
            .ok_or_else(|| GitHubError::NotFound {
                endpoint: format!("/repos/{owner}/{repo}/git/trees/{branch}"),
            })
    }

    async fn get_file_content(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<ContentResponse, GitHubError> {
        self.observe_call(format!("/repos/{owner}/{repo}/contents/{path}"), token)
            .await?;

        self.contents
            .get(&format!("{owner}/{repo}:{path}"))
            .cloned()
            .ok_or_else(|| GitHubError::NotFound {
                endpoint: format!("/repos/{owner}/{repo}/contents/{path}"),
            })
    }

    async fn list_webhooks(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<WebhookResponse>, GitHubError> {
        self.observe_call(format!("/repos/{owner}/{repo}/hooks"), token)
            .await?;

        Ok(self
            .webhooks
            .get(&format!("{owner}/{repo}"))
            .cloned()
            .unwrap_or_default())
    }
}
