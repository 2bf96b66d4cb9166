//! GitHub API client implementation

use crate::{
    error::GitHubError,
    types::{ContentResponse, RepositoryResponse, TreeResponse, WebhookResponse},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

/// Default public GitHub API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "repo-scanner";

/// Boundary the scanner talks to GitHub through.
///
/// The production implementation is [`GitHubClient`]; tests substitute a
/// scripted mock. Tokens are passed per call, never stored.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Repositories visible to the token's user, most recently updated first.
    async fn list_user_repositories(
        &self,
        token: &str,
    ) -> Result<Vec<RepositoryResponse>, GitHubError>;

    /// A single repository by owner and name.
    async fn get_repository(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryResponse, GitHubError>;

    /// The recursive git tree of `branch`.
    async fn get_repository_tree(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<TreeResponse, GitHubError>;

    /// Content of a single file.
    async fn get_file_content(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<ContentResponse, GitHubError>;

    /// Webhooks configured on the repository. Missing hooks or insufficient
    /// permissions yield an empty list rather than an error.
    async fn list_webhooks(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<WebhookResponse>, GitHubError>;
}

/// GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client against `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::RequestFailed` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GitHubError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GitHubError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create a client against the public GitHub API with defaults.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::RequestFailed` if the underlying HTTP client
    /// cannot be constructed.
    pub fn default_client() -> Result<Self, GitHubError> {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        token: &str,
        endpoint: &str,
    ) -> Result<T, GitHubError> {
        let url = format!("{}{endpoint}", self.base_url);
        let started = Instant::now();

        tracing::debug!(endpoint, "GitHub API request started");

        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GitHubError::Timeout
                } else {
                    GitHubError::RequestFailed(e.to_string())
                }
            })?;

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(
            endpoint,
            status = response.status().as_u16(),
            duration_ms,
            "GitHub API response received"
        );

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(GitHubError::Unauthorized),
            StatusCode::NOT_FOUND => Err(GitHubError::NotFound {
                endpoint: endpoint.to_owned(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(GitHubError::RateLimited),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| GitHubError::ResponseParseFailed(e.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GitHubError::Api {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn list_user_repositories(
        &self,
        token: &str,
    ) -> Result<Vec<RepositoryResponse>, GitHubError> {
        self.request(token, "/user/repos?per_page=100&sort=updated")
            .await
    }

    async fn get_repository(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryResponse, GitHubError> {
        self.request(token, &format!("/repos/{owner}/{repo}")).await
    }

    async fn get_repository_tree(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<TreeResponse, GitHubError> {
        self.request(
            token,
            &format!("/repos/{owner}/{repo}/git/trees/{branch}?recursive=1"),
        )
        .await
    }

    async fn get_file_content(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<ContentResponse, GitHubError> {
        self.request(token, &format!("/repos/{owner}/{repo}/contents/{path}"))
            .await
    }

    async fn list_webhooks(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<WebhookResponse>, GitHubError> {
        match self
            .request::<Vec<WebhookResponse>>(token, &format!("/repos/{owner}/{repo}/hooks"))
            .await
        {
            Ok(hooks) => Ok(hooks),
            Err(GitHubError::NotFound { .. }) => Ok(Vec::new()),
            Err(GitHubError::Api { status: 403, .. }) => {
                tracing::warn!(owner, repository = repo, "insufficient permissions to list webhooks");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
