//! Domain types exchanged with the code-hosting API, independent of the
//! HTTP wire shapes used to obtain them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// A repository identified by owner/name, addressable on a single host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parses a submission URL into a `RepoRef`.
    ///
    /// Accepts `https://github.com/<owner>/<repo>[/]` and
    /// `git@github.com:<owner>/<repo>.git`; owner/name must match
    /// `[A-Za-z0-9_.-]+`.
    pub fn parse(repo_url: &str) -> Result<Self, ConfigError> {
        let trimmed = repo_url.trim();

        let rest = if let Some(r) = trimmed.strip_prefix("https://github.com/") {
            r
        } else if let Some(r) = trimmed.strip_prefix("git@github.com:") {
            r
        } else {
            return Err(ConfigError::UnrecognizedRepoUrl(repo_url.to_string()));
        };

        let rest = rest.trim_end_matches('/').trim_end_matches(".git");
        let mut parts = rest.splitn(2, '/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();

        if owner.is_empty() || name.is_empty() || !is_valid_segment(owner) || !is_valid_segment(name) {
            return Err(ConfigError::UnrecognizedRepoUrl(repo_url.to_string()));
        }

        Ok(RepoRef {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

fn is_valid_segment(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

/// Pull request metadata as returned by `getPullRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub base_branch: String,
    pub head_branch: String,
    pub base_sha: String,
    pub head_sha: String,
    pub created_at: DateTime<Utc>,
}

/// One changed-file record as returned by `getPRFiles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrFile {
    pub path: String,
    pub status: String,
    pub additions: u32,
    pub deletions: u32,
    pub changes: u32,
    pub patch: Option<String>,
}
