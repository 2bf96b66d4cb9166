//! Domain model returned to API clients.

use repo_scanner_github::WebhookResponse;
use serde::Serialize;

/// A repository in the listing view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Short repository name.
    pub name: String,
    /// Repository size in kilobytes.
    pub size: u64,
    /// Owner login.
    pub owner: String,
}

/// Scan result for one repository.
///
/// Fields outside the requested selection are omitted from the serialized
/// response; `contentOfOneYamlFile` is also omitted when the repository has
/// no YAML file or its content could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDetails {
    /// Short repository name.
    pub name: String,
    /// Repository size in kilobytes.
    pub size: u64,
    /// Owner login.
    pub owner: String,
    /// Whether the repository is private.
    pub is_private: bool,
    /// Number of files (blobs) in the repository tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_files: Option<u64>,
    /// Decoded content of the first YAML file found in the tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_of_one_yaml_file: Option<String>,
    /// Webhooks with deliveries enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_webhooks: Option<Vec<Webhook>>,
}

/// An active webhook configured on a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// Numeric hook id.
    pub id: u64,
    /// Hook name.
    pub name: String,
    /// Whether deliveries are enabled.
    pub active: bool,
    /// Delivery url, empty when the hook has none configured.
    pub url: String,
    /// Subscribed event names.
    pub events: Vec<String>,
}

impl From<WebhookResponse> for Webhook {
    fn from(hook: WebhookResponse) -> Self {
        Self {
            id: hook.id,
            name: hook.name,
            active: hook.active,
            url: hook.config.url.unwrap_or_default(),
            events: hook.events,
        }
    }
}
