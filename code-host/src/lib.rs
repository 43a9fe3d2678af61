//! Code-hosting API client.
//!
//! Exposes the three operations the task worker needs: pull-request
//! metadata, the paginated changed-file list, and file content at a
//! revision. Only GitHub is supported; the submission URL grammar is
//! enforced by [`types::RepoRef::parse`].

pub mod errors;
pub mod github;
pub mod types;

pub use errors::{ConfigError, Error, HostResult, ProviderError};
pub use github::GitHubClient;
pub use types::{PrFile, PullRequest, RepoRef};
