//! GitHub REST v3 client for pull-request metadata, changed-file listings,
//! and file content at a revision.
//!
//! Endpoints used:
//! - GET /repos/{owner}/{repo}/pulls/{number}
//! - GET /repos/{owner}/{repo}/pulls/{number}/files (paginated)
//! - GET /repos/{owner}/{repo}/contents/{path}?ref={sha}

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{HostResult, ProviderError};
use crate::types::{PrFile, PullRequest, RepoRef};

const PER_PAGE: u32 = 100;
const MAX_PAGES: u32 = 50;
const MAX_FILES: usize = 5000;
const CALL_TIMEOUT_SECS: u64 = 30;

/// Thin REST client over the GitHub API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String,
    token: String,
}

impl GitHubClient {
    /// Builds a client with a bounded keep-alive pool and a 30s per-call timeout.
    pub fn new(base_api: String, token: String) -> HostResult<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(CALL_TIMEOUT_SECS))
            .user_agent("code-host/0.1")
            .build()
            .map_err(ProviderError::from)?;
        Ok(Self {
            http,
            base_api,
            token,
        })
    }

    fn auth(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        rb.header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
    }

    /// Fetches PR metadata.
    pub async fn get_pull_request(&self, repo: &RepoRef, pr_number: u64) -> HostResult<PullRequest> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.base_api, repo.owner, repo.name, pr_number
        );
        let resp = self.auth(self.http.get(&url)).send().await?;
        let resp = classify(resp).await?;
        let raw: GhPullRequest = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(PullRequest {
            number: raw.number,
            title: raw.title,
            author: raw.user.login,
            base_branch: raw.base.r#ref,
            head_branch: raw.head.r#ref,
            base_sha: raw.base.sha,
            head_sha: raw.head.sha,
            created_at: raw.created_at,
        })
    }

    /// Fetches the full list of changed files, paging until the host reports
    /// a short page or the hard ceiling (50 pages / 5000 files) is reached.
    pub async fn get_pr_files(&self, repo: &RepoRef, pr_number: u64) -> HostResult<Vec<PrFile>> {
        let mut files = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/repos/{}/{}/pulls/{}/files?per_page={PER_PAGE}&page={page}",
                self.base_api, repo.owner, repo.name, pr_number
            );
            let resp = self.auth(self.http.get(&url)).send().await?;
            let resp = classify(resp).await?;
            let batch: Vec<GhFile> = resp
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

            let batch_len = batch.len();
            files.extend(batch.into_iter().map(|f| PrFile {
                path: f.filename,
                status: f.status,
                additions: f.additions,
                deletions: f.deletions,
                changes: f.changes,
                patch: f.patch,
            }));

            if files.len() >= MAX_FILES {
                files.truncate(MAX_FILES);
                warn!(
                    pr_number,
                    page, "reached maximum file pagination limit (5000 files)"
                );
                break;
            }
            if (batch_len as u32) < PER_PAGE {
                break;
            }
            if page >= MAX_PAGES {
                warn!(pr_number, "reached maximum file pagination page limit (50 pages)");
                break;
            }
            page += 1;
        }

        debug!(pr_number, files = files.len(), "fetched PR file list");
        Ok(files)
    }

    /// Fetches the UTF-8 content of a file at `git_ref`.
    ///
    /// Returns an empty string if the file does not exist at that revision.
    pub async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: &str,
    ) -> HostResult<String> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.base_api,
            repo.owner,
            repo.name,
            urlencoding::encode(path),
            urlencoding::encode(git_ref)
        );
        let resp = self.auth(self.http.get(&url)).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(String::new());
        }
        let resp = classify(resp).await?;
        let raw: GhContent = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if raw.encoding != "base64" {
            return Err(ProviderError::InvalidResponse(format!(
                "unsupported content encoding: {}",
                raw.encoding
            ))
            .into());
        }
        let cleaned: String = raw.content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, cleaned)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Maps a non-2xx response into a `ProviderError`, preserving a `Retry-After`
/// hint for 429s when the server supplied one.
async fn classify(resp: reqwest::Response) -> HostResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let err = match status.as_u16() {
        401 => ProviderError::Unauthorized,
        403 => ProviderError::Forbidden,
        404 => ProviderError::NotFound,
        429 => {
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            ProviderError::RateLimited { retry_after_secs }
        }
        500..=599 => ProviderError::Server(status.as_u16()),
        other => ProviderError::HttpStatus(other),
    };
    Err(err.into())
}

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    number: u64,
    title: String,
    user: GhUser,
    base: GhBranchRef,
    head: GhBranchRef,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhBranchRef {
    r#ref: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GhFile {
    filename: String,
    status: String,
    additions: u32,
    deletions: u32,
    changes: u32,
    patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhContent {
    content: String,
    encoding: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_and_ssh_urls() {
        let a = RepoRef::parse("https://github.com/acme/widgets").unwrap();
        assert_eq!(a.owner, "acme");
        assert_eq!(a.name, "widgets");

        let b = RepoRef::parse("https://github.com/acme/widgets/").unwrap();
        assert_eq!(b, a);

        let c = RepoRef::parse("git@github.com:acme/widgets.git").unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn rejects_other_hosts() {
        assert!(RepoRef::parse("https://gitlab.com/acme/widgets").is_err());
        assert!(RepoRef::parse("not a url").is_err());
    }
}
