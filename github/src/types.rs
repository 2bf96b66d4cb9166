//! Wire types for the GitHub REST API.
//!
//! Field names follow the GitHub v3 JSON shapes; only the fields the scanner
//! consumes are modeled.

use serde::Deserialize;

/// A repository as returned by `/user/repos` and `/repos/{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryResponse {
    /// Numeric repository id.
    pub id: u64,
    /// Short repository name.
    pub name: String,
    /// `owner/name` form.
    pub full_name: String,
    /// Whether the repository is private.
    #[serde(rename = "private")]
    pub is_private: bool,
    /// Owning user or organization.
    pub owner: OwnerResponse,
    /// Repository size in kilobytes.
    pub size: u64,
    /// Name of the default branch.
    pub default_branch: String,
}

/// Owner object embedded in repository responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnerResponse {
    /// Login name.
    pub login: String,
    /// Numeric account id.
    pub id: u64,
}

/// A git tree as returned by `/repos/{owner}/{repo}/git/trees/{branch}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeResponse {
    /// Sha of the tree object.
    #[serde(default)]
    pub sha: String,
    /// API url of the tree object.
    #[serde(default)]
    pub url: String,
    /// Tree entries.
    pub tree: Vec<TreeItem>,
    /// Set when the tree was too large to return in full.
    #[serde(default)]
    pub truncated: bool,
}

impl TreeResponse {
    /// Empty tree, used when a repository has no resolvable branch.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sha: String::new(),
            url: String::new(),
            tree: Vec::new(),
            truncated: false,
        }
    }
}

/// One entry of a git tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeItem {
    /// Path relative to the repository root.
    pub path: String,
    /// File mode string.
    #[serde(default)]
    pub mode: String,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: TreeItemKind,
    /// Object sha.
    #[serde(default)]
    pub sha: String,
    /// Blob size in bytes, absent for trees.
    #[serde(default)]
    pub size: Option<u64>,
    /// API url of the object.
    #[serde(default)]
    pub url: String,
}

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeItemKind {
    /// A file.
    Blob,
    /// A directory.
    Tree,
    /// Anything else (submodule commits and future kinds).
    #[serde(other)]
    Other,
}

/// File content as returned by `/repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentResponse {
    /// File name.
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// Object sha.
    #[serde(default)]
    pub sha: String,
    /// File size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Encoded file content.
    pub content: String,
    /// Content encoding, `base64` in practice.
    pub encoding: String,
}

/// A webhook as returned by `/repos/{owner}/{repo}/hooks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookResponse {
    /// Numeric hook id.
    pub id: u64,
    /// Hook name, `web` for standard webhooks.
    pub name: String,
    /// Whether deliveries are enabled.
    pub active: bool,
    /// Subscribed event names.
    pub events: Vec<String>,
    /// Delivery configuration.
    #[serde(default)]
    pub config: WebhookConfig,
}

/// Delivery configuration of a webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookConfig {
    /// Delivery url, absent for some hook types.
    #[serde(default)]
    pub url: Option<String>,
    /// Payload content type.
    #[serde(default)]
    pub content_type: Option<String>,
}
