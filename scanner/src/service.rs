//! Repository scan service.
//!
//! Fetches listing and scan data from GitHub and assembles the domain model.
//! The service is generic over [`GitHubApi`] so tests can script the
//! upstream; it knows nothing about admission. The caller admits the
//! request first and hands in the request's [`FanOutListener`] so the
//! tracked fields report their start and finish.

use crate::error::ScanError;
use crate::model::{Repository, RepositoryDetails, Webhook};
use crate::operation::DetailField;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use repo_scanner_gate::FanOutListener;
use repo_scanner_github::{GitHubApi, TreeItem, TreeItemKind, TreeResponse};
use std::sync::Arc;
use std::time::Instant;

const YAML_EXTENSIONS: [&str; 2] = [".yaml", ".yml"];

/// Service over the GitHub boundary.
#[derive(Debug)]
pub struct RepositoryService<G: ?Sized> {
    github: Arc<G>,
}

impl<G: ?Sized> Clone for RepositoryService<G> {
    fn clone(&self) -> Self {
        Self {
            github: Arc::clone(&self.github),
        }
    }
}

impl<G: GitHubApi + ?Sized> RepositoryService<G> {
    /// Service over the given GitHub client.
    #[must_use]
    pub fn new(github: Arc<G>) -> Self {
        Self { github }
    }

    /// List the token user's repositories. Ungated.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Validation` for an empty token and propagates
    /// GitHub failures.
    pub async fn list_repositories(&self, token: &str) -> Result<Vec<Repository>, ScanError> {
        validate_token(token)?;

        let started = Instant::now();
        tracing::info!(operation = "list_repositories", "fetching user repositories");

        match self.github.list_user_repositories(token).await {
            Ok(repos) => {
                let repositories: Vec<Repository> = repos
                    .into_iter()
                    .map(|repo| Repository {
                        name: repo.name,
                        size: repo.size,
                        owner: repo.owner.login,
                    })
                    .collect();

                tracing::info!(
                    operation = "list_repositories",
                    count = repositories.len(),
                    duration_ms = duration_ms(started),
                    "fetched user repositories"
                );
                Ok(repositories)
            }
            Err(e) => {
                tracing::error!(
                    operation = "list_repositories",
                    error = %e,
                    duration_ms = duration_ms(started),
                    "failed to fetch user repositories"
                );
                Err(e.into())
            }
        }
    }

    /// Scan one repository, resolving the selected detail fields
    /// concurrently under the request's fan-out listener.
    ///
    /// The caller must have gone through admission before calling; every
    /// fetch here runs while the request's slot is held.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Validation` for malformed arguments and
    /// propagates GitHub failures from the base fetch or any selected
    /// field. A failed field still reports its finish to the listener
    /// before the error surfaces.
    pub async fn scan_repository(
        &self,
        token: &str,
        owner: &str,
        repo_name: &str,
        selection: &[DetailField],
        listener: &FanOutListener,
    ) -> Result<RepositoryDetails, ScanError> {
        validate_token(token)?;
        validate_name("owner", owner)?;
        validate_name("repoName", repo_name)?;

        let started = Instant::now();
        tracing::info!(
            operation = "scan_repository",
            owner,
            repository = repo_name,
            "scanning repository"
        );

        let result = self
            .fetch_details(token, owner, repo_name, selection, listener)
            .await;

        match &result {
            Ok(_) => tracing::info!(
                operation = "scan_repository",
                owner,
                repository = repo_name,
                duration_ms = duration_ms(started),
                "repository scan complete"
            ),
            Err(e) => tracing::error!(
                operation = "scan_repository",
                owner,
                repository = repo_name,
                error = %e,
                duration_ms = duration_ms(started),
                "repository scan failed"
            ),
        }

        result
    }

    async fn fetch_details(
        &self,
        token: &str,
        owner: &str,
        repo_name: &str,
        selection: &[DetailField],
        listener: &FanOutListener,
    ) -> Result<RepositoryDetails, ScanError> {
        let repo = self.github.get_repository(token, owner, repo_name).await?;

        // Entity key: stable identity of the scan target
        let entity = format!("{owner}/{repo_name}");
        let wants = |field: DetailField| selection.contains(&field);

        let files = if wants(DetailField::NumberOfFiles) || wants(DetailField::ContentOfOneYamlFile)
        {
            let tree = self
                .tree_with_fallback(token, owner, repo_name, &repo.default_branch)
                .await;
            tree.tree
                .into_iter()
                .filter(|item| item.kind == TreeItemKind::Blob)
                .collect()
        } else {
            Vec::new()
        };

        let number_of_files = async {
            if !wants(DetailField::NumberOfFiles) {
                return Ok(None);
            }
            listener
                .observe(DetailField::NumberOfFiles.name(), Some(&entity), async {
                    Ok::<_, ScanError>(files.len() as u64)
                })
                .await
                .map(Some)
        };

        let yaml_content = async {
            if !wants(DetailField::ContentOfOneYamlFile) {
                return Ok(None);
            }
            listener
                .observe(
                    DetailField::ContentOfOneYamlFile.name(),
                    Some(&entity),
                    async {
                        Ok::<_, ScanError>(
                            self.first_yaml_content(token, owner, repo_name, &files).await,
                        )
                    },
                )
                .await
        };

        let active_webhooks = async {
            if !wants(DetailField::ActiveWebhooks) {
                return Ok(None);
            }
            listener
                .observe(DetailField::ActiveWebhooks.name(), Some(&entity), async {
                    let hooks = self.github.list_webhooks(token, owner, repo_name).await?;
                    Ok::<_, ScanError>(
                        hooks
                            .into_iter()
                            .filter(|hook| hook.active)
                            .map(Webhook::from)
                            .collect::<Vec<_>>(),
                    )
                })
                .await
                .map(Some)
        };

        let (number_of_files, content_of_one_yaml_file, active_webhooks) =
            tokio::join!(number_of_files, yaml_content, active_webhooks);

        Ok(RepositoryDetails {
            name: repo.name,
            size: repo.size,
            owner: repo.owner.login,
            is_private: repo.is_private,
            number_of_files: number_of_files?,
            content_of_one_yaml_file: content_of_one_yaml_file?,
            active_webhooks: active_webhooks?,
        })
    }

    /// Tree of the default branch, falling back to `master`, falling back to
    /// an empty tree. A repository with no resolvable branch scans as empty
    /// rather than failing.
    async fn tree_with_fallback(
        &self,
        token: &str,
        owner: &str,
        repo_name: &str,
        default_branch: &str,
    ) -> TreeResponse {
        match self
            .github
            .get_repository_tree(token, owner, repo_name, default_branch)
            .await
        {
            Ok(tree) => tree,
            Err(first) => {
                tracing::debug!(
                    owner,
                    repository = repo_name,
                    branch = default_branch,
                    error = %first,
                    "tree fetch failed, retrying with master"
                );
                match self
                    .github
                    .get_repository_tree(token, owner, repo_name, "master")
                    .await
                {
                    Ok(tree) => tree,
                    Err(second) => {
                        tracing::warn!(
                            owner,
                            repository = repo_name,
                            error = %second,
                            "no resolvable branch, treating tree as empty"
                        );
                        TreeResponse::empty()
                    }
                }
            }
        }
    }

    /// Decoded content of the first YAML file in tree order, or `None` when
    /// the repository has none or the fetch fails. Content failures degrade
    /// the field, never the scan.
    async fn first_yaml_content(
        &self,
        token: &str,
        owner: &str,
        repo_name: &str,
        files: &[TreeItem],
    ) -> Option<String> {
        let yaml_file = files.iter().find(|file| {
            let lower = file.path.to_lowercase();
            YAML_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        });

        let Some(yaml_file) = yaml_file else {
            tracing::debug!(owner, repository = repo_name, "no YAML file found in repository");
            return None;
        };

        match self
            .github
            .get_file_content(token, owner, repo_name, &yaml_file.path)
            .await
        {
            Ok(content) => match decode_base64_content(&content.content) {
                Some(decoded) => {
                    tracing::debug!(
                        owner,
                        repository = repo_name,
                        file_path = %yaml_file.path,
                        "fetched YAML file content"
                    );
                    Some(decoded)
                }
                None => {
                    tracing::warn!(
                        owner,
                        repository = repo_name,
                        file_path = %yaml_file.path,
                        "YAML file content was not valid base64"
                    );
                    None
                }
            },
            Err(e) => {
                tracing::warn!(
                    owner,
                    repository = repo_name,
                    file_path = %yaml_file.path,
                    error = %e,
                    "failed to fetch YAML file content"
                );
                None
            }
        }
    }
}

/// GitHub serves base64 content with embedded newlines; strip whitespace
/// before decoding.
fn decode_base64_content(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64.decode(compact).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn validate_token(token: &str) -> Result<(), ScanError> {
    if token.trim().is_empty() {
        return Err(ScanError::validation("token", "GitHub token is required"));
    }
    Ok(())
}

fn validate_name(field: &'static str, value: &str) -> Result<(), ScanError> {
    if value.trim().is_empty() {
        return Err(ScanError::validation(field, format!("{field} is required")));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ScanError::validation(field, format!("invalid {field} format")));
    }
    Ok(())
}

fn duration_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_with_newlines() {
        // "name: demo\n" encoded the way GitHub serves it, split over lines
        let encoded = "bmFtZTog\nZGVtbwo=\n";
        assert_eq!(decode_base64_content(encoded).unwrap(), "name: demo\n");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_base64_content("!!not base64!!").is_none());
    }

    #[test]
    fn test_validate_name_rejects_path_traversal() {
        assert!(validate_name("repoName", "../etc").is_err());
        assert!(validate_name("repoName", "a/b").is_err());
        assert!(validate_name("repoName", "").is_err());
        assert!(validate_name("repoName", "my-repo_v2.1").is_ok());
    }

    #[test]
    fn test_validate_token_rejects_blank() {
        assert!(validate_token("   ").is_err());
        assert!(validate_token("ghp_abc").is_ok());
    }
}
