//! VCS host client: resolves a repository URL plus optional ref to a
//! concrete commit SHA and a downloadable archive URL, so the node package
//! manager's acquire step (§4.5 step 3) can prefer an archive fetch over a
//! full clone when the host supports it.

use serde::Deserialize;
use url::Url;

use crate::error::{ExternalError, ExternalResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub sha: String,
    pub archive_url: Option<String>,
}

#[async_trait::async_trait]
pub trait VcsHostClient: Send + Sync {
    /// Normalizes a repository URL the way §4.5 step 2's conflict detector
    /// does: strip scheme, `git@`/`ssh://` prefixes, trailing `.git`, and
    /// lowercase.
    fn normalize_remote(&self, remote: &str) -> String {
        normalize_remote(remote)
    }

    async fn resolve_ref(&self, repo_url: &str, ref_spec: Option<&str>) -> ExternalResult<ResolvedRef>;
}

pub fn normalize_remote(remote: &str) -> String {
    let mut s = remote.trim().to_ascii_lowercase();
    for prefix in ["https://", "http://", "git@", "ssh://", "git://"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.to_string();
            break;
        }
    }
    s = s.replace(':', "/");
    if let Some(stripped) = s.strip_suffix(".git") {
        s = stripped.to_string();
    }
    s.trim_end_matches('/').to_string()
}

#[derive(Debug, Deserialize)]
struct GitHubCommitResponse {
    sha: String,
}

pub struct GitHubClient {
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn owner_repo(&self, repo_url: &str) -> ExternalResult<(String, String)> {
        let normalized = normalize_remote(repo_url);
        let mut parts = normalized.trim_start_matches("github.com/").splitn(2, '/');
        let owner = parts.next().filter(|s| !s.is_empty());
        let repo = parts.next().filter(|s| !s.is_empty());
        match (owner, repo) {
            (Some(owner), Some(repo)) => Ok((owner.to_string(), repo.to_string())),
            _ => Err(ExternalError::UnsupportedHost(repo_url.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl VcsHostClient for GitHubClient {
    async fn resolve_ref(&self, repo_url: &str, ref_spec: Option<&str>) -> ExternalResult<ResolvedRef> {
        let (owner, repo) = self.owner_repo(repo_url)?;
        let branch_or_sha = ref_spec.unwrap_or("HEAD");
        let url = format!("https://api.github.com/repos/{owner}/{repo}/commits/{branch_or_sha}");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "comfygit")
            .send()
            .await
            .map_err(|source| ExternalError::Http { url: url.clone(), source })?;

        if !response.status().is_success() {
            return Err(ExternalError::UnexpectedStatus { url, status: response.status() });
        }

        let body: GitHubCommitResponse = response
            .json()
            .await
            .map_err(|source| ExternalError::Http { url: url.clone(), source })?;

        let archive_url = Some(format!("https://codeload.github.com/{owner}/{repo}/tar.gz/{}", body.sha));
        Ok(ResolvedRef { sha: body.sha, archive_url })
    }
}

/// True if `a` and `b` name the same repository once normalized, matching
/// §4.5 step 2's `SameRepo` conflict classification.
pub fn same_repository(a: &str, b: &str) -> bool {
    normalize_remote(a) == normalize_remote(b)
}

pub fn parse_remote_url(remote: &str) -> ExternalResult<Url> {
    Url::parse(remote).map_err(|_| ExternalError::UnsupportedHost(remote.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_scheme_suffix_and_case() {
        assert_eq!(
            normalize_remote("https://github.com/ltdrdata/ComfyUI-Impact-Pack.git"),
            "github.com/ltdrdata/comfyui-impact-pack"
        );
        assert_eq!(
            normalize_remote("git@github.com:ltdrdata/ComfyUI-Impact-Pack.git"),
            "github.com/ltdrdata/comfyui-impact-pack"
        );
    }

    #[test]
    fn same_repository_ignores_case_and_protocol() {
        assert!(same_repository(
            "https://github.com/ltdrdata/ComfyUI-Impact-Pack.git",
            "git@github.com:ltdrdata/comfyui-impact-pack.git"
        ));
    }

    #[test]
    fn different_repos_are_not_equal() {
        assert!(!same_repository(
            "https://github.com/ltdrdata/ComfyUI-Impact-Pack.git",
            "https://github.com/someoneelse/other-repo.git"
        ));
    }
}
