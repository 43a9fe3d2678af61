//! Ports the Task Worker depends on for persistence and queue
//! acknowledgement. Concrete implementations live in
//! `repository-store` and `task-queue`; kept as traits here so the worker
//! stays testable against in-memory fakes.

use std::future::Future;

use code_host::{GitHubClient, PrFile, PullRequest, RepoRef};

use crate::errors::AnalysisError;
use crate::models::{FileAnalysis, Issue, PrAnalysis, Task};

/// The PR-metadata/file-listing/file-content surface the worker needs
/// from a code host. A trait rather than the concrete `GitHubClient` so
/// integration tests can stub it without a real network call.
pub trait CodeHost: Send + Sync + 'static {
    fn get_pull_request(
        &self,
        repo: &RepoRef,
        pr_number: u64,
    ) -> impl Future<Output = Result<PullRequest, AnalysisError>> + Send;

    fn get_pr_files(
        &self,
        repo: &RepoRef,
        pr_number: u64,
    ) -> impl Future<Output = Result<Vec<PrFile>, AnalysisError>> + Send;

    fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        commit_sha: &str,
    ) -> impl Future<Output = Result<String, AnalysisError>> + Send;
}

impl CodeHost for GitHubClient {
    async fn get_pull_request(&self, repo: &RepoRef, pr_number: u64) -> Result<PullRequest, AnalysisError> {
        GitHubClient::get_pull_request(self, repo, pr_number)
            .await
            .map_err(AnalysisError::from)
    }

    async fn get_pr_files(&self, repo: &RepoRef, pr_number: u64) -> Result<Vec<PrFile>, AnalysisError> {
        GitHubClient::get_pr_files(self, repo, pr_number)
            .await
            .map_err(AnalysisError::from)
    }

    async fn get_file_content(&self, repo: &RepoRef, path: &str, commit_sha: &str) -> Result<String, AnalysisError> {
        GitHubClient::get_file_content(self, repo, path, commit_sha)
            .await
            .map_err(AnalysisError::from)
    }
}

/// Durable persistence of Task/PRAnalysis/FileAnalysis/Issue records.
pub trait Repository: Send + Sync {
    fn get_task(&self, task_id: &str) -> impl Future<Output = Result<Option<Task>, AnalysisError>> + Send;

    fn update_task(&self, task: &Task) -> impl Future<Output = Result<(), AnalysisError>> + Send;

    fn get_pr_analysis_by_task_id(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<Option<PrAnalysis>, AnalysisError>> + Send;

    fn insert_pr_analysis(&self, pr: &PrAnalysis) -> impl Future<Output = Result<(), AnalysisError>> + Send;

    fn update_pr_analysis(&self, pr: &PrAnalysis) -> impl Future<Output = Result<(), AnalysisError>> + Send;

    /// Writes one FileAnalysis row and its Issue rows atomically. Must be
    /// safe to call twice for the same `(pr_analysis_id, file_path)` under
    /// re-delivery without duplicating Issue rows — implementations upsert
    /// keyed on
    /// `(pr_analysis_id, issue_type, file_path, line, rule_id, title)`.
    fn insert_file_analysis(
        &self,
        file_analysis: &FileAnalysis,
        issues: &[Issue],
    ) -> impl Future<Output = Result<(), AnalysisError>> + Send;
}

/// Outcome reported to the queue when a task reaches a terminal or
/// retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    Success,
    Failure,
    Retry,
}

/// At-least-once task delivery.
pub trait Queue: Send + Sync {
    fn update_progress(
        &self,
        ticket_id: &str,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), AnalysisError>> + Send;

    fn mark_terminal(
        &self,
        ticket_id: &str,
        outcome: TerminalOutcome,
        info: serde_json::Value,
    ) -> impl Future<Output = Result<(), AnalysisError>> + Send;
}
