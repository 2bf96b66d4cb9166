//! # Repo Scanner Testing
//!
//! Testing utilities and mocks for the repo scanner.
//!
//! This crate provides:
//! - [`MockGitHub`]: a scripted, in-memory [`GitHubApi`] implementation
//! - [`fixtures`]: builders for GitHub wire-type test data
//!
//! ## Example
//!
//! ```
//! use repo_scanner_testing::{MockGitHub, fixtures};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use repo_scanner_github::GitHubApi;
//!
//! let github = MockGitHub::new()
//!     .with_repository("acme", "widget")
//!     .with_tree("acme", "widget", "main", fixtures::tree(&["src/main.rs", "ci.yaml"]));
//!
//! let repo = github.get_repository("t0k3n", "acme", "widget").await.unwrap();
//! assert_eq!(repo.default_branch, "main");
//! # }
//! ```

pub mod mocks;

pub use mocks::{MockGitHub, fixtures};
