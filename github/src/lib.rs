//! # GitHub API Client
//!
//! Rust client for the slice of the GitHub REST API the repo scanner
//! consumes: repository listing, repository metadata, git trees, file
//! contents, and webhooks.
//!
//! ## Example
//!
//! ```no_run
//! use repo_scanner_github::{GitHubApi, GitHubClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GitHubClient::default_client()?;
//!
//!     let repos = client.list_user_repositories("ghp_token").await?;
//!     for repo in repos {
//!         println!("{} ({} KB)", repo.full_name, repo.size);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Behavior notes
//!
//! - Tokens are passed per call and never stored or logged.
//! - 401/404/429 map to dedicated [`GitHubError`] variants; webhook listing
//!   treats 403 and 404 as "no webhooks visible" rather than failures.
//! - Every request carries the `2022-11-28` API version header and a fixed
//!   timeout.

pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, GitHubApi, GitHubClient};
pub use error::GitHubError;
pub use types::{
    ContentResponse, OwnerResponse, RepositoryResponse, TreeItem, TreeItemKind, TreeResponse,
    WebhookConfig, WebhookResponse,
};
