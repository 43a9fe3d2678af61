//! End-to-end scenarios for the Task Worker, run against in-memory fakes
//! for the repository and queue, a stub code host, and the real LLM and
//! embeddings clients pointed at unreachable or mocked backends so each
//! run is deterministic without a live LLM or embeddings service.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use analysis_core::{
    run_task_with_retries, AnalysisError, CodeHost, PrAnalysis, PrAnalysisStatus, Queue,
    Repository, Task, TaskPriority, TaskStatus, TerminalOutcome,
};
use code_host::{PrFile, PullRequest, RepoRef};
use embeddings_engine::{EmbeddingConfig, EmbeddingEngine};
use llm_client::{LlmClient, LlmConfig};

/// Degraded LLM client: no API key, so every call returns the canned
/// responses in `llm_client::prompts` without a network round-trip.
fn degraded_llm() -> Arc<LlmClient> {
    Arc::new(
        LlmClient::new(LlmConfig {
            base_url: "https://llm.invalid".to_string(),
            api_key: None,
            model: "test-model".to_string(),
            temperature: 0.1,
            max_tokens: 256,
        })
        .expect("degraded client always builds"),
    )
}

/// Embeddings engine pointed at an address nothing is listening on; every
/// call falls back to a zero vector, which in turn yields a duplication
/// score of zero — deterministic without a real embeddings backend.
fn unreachable_embeddings() -> Arc<EmbeddingEngine> {
    Arc::new(EmbeddingEngine::new(EmbeddingConfig {
        model: "test-embed".to_string(),
        dim: 8,
        base_url: "http://127.0.0.1:1".to_string(),
    }))
}

fn new_task(pr_number: u64) -> Task {
    Task::new(
        Uuid::new_v4().to_string(),
        "https://github.com/acme/widgets".to_string(),
        "acme".to_string(),
        "widgets".to_string(),
        pr_number,
        TaskPriority::Normal,
    )
}

fn pull_request(number: u64) -> PullRequest {
    PullRequest {
        number,
        title: "Add feature".to_string(),
        author: "octocat".to_string(),
        base_branch: "main".to_string(),
        head_branch: "feature".to_string(),
        base_sha: "base-sha".to_string(),
        head_sha: "head-sha".to_string(),
        created_at: chrono::Utc::now(),
    }
}

fn pr_file(path: &str) -> PrFile {
    PrFile {
        path: path.to_string(),
        status: "modified".to_string(),
        additions: 4,
        deletions: 1,
        changes: 5,
        patch: Some("@@ -1,1 +1,4 @@".to_string()),
    }
}

/// Stub code host: hands back a canned PR + file listing, optionally refusing
/// auth or panicking on a specific file's content fetch so the worker's
/// per-file fan-out can be exercised under failure.
struct FakeCodeHost {
    pr: Option<PullRequest>,
    files: Vec<PrFile>,
    contents: HashMap<String, String>,
    panic_path: Option<String>,
}

impl FakeCodeHost {
    fn new(pr: PullRequest, files: Vec<PrFile>) -> Self {
        Self {
            pr: Some(pr),
            files,
            contents: HashMap::new(),
            panic_path: None,
        }
    }

    fn unauthorized() -> Self {
        Self {
            pr: None,
            files: Vec::new(),
            contents: HashMap::new(),
            panic_path: None,
        }
    }

    fn with_content(mut self, path: &str, content: &str) -> Self {
        self.contents.insert(path.to_string(), content.to_string());
        self
    }

    fn panicking_on(mut self, path: &str) -> Self {
        self.panic_path = Some(path.to_string());
        self
    }
}

impl CodeHost for FakeCodeHost {
    async fn get_pull_request(&self, _repo: &RepoRef, _pr_number: u64) -> Result<PullRequest, AnalysisError> {
        self.pr
            .clone()
            .ok_or_else(|| AnalysisError::Unauthorized("no access to repository".to_string()))
    }

    async fn get_pr_files(&self, _repo: &RepoRef, _pr_number: u64) -> Result<Vec<PrFile>, AnalysisError> {
        Ok(self.files.clone())
    }

    async fn get_file_content(&self, _repo: &RepoRef, path: &str, _commit_sha: &str) -> Result<String, AnalysisError> {
        if self.panic_path.as_deref() == Some(path) {
            panic!("simulated content-fetch panic for {path}");
        }
        Ok(self.contents.get(path).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeRepositoryState {
    tasks: HashMap<String, Task>,
    pr_analyses: HashMap<String, PrAnalysis>,
    pr_by_task: HashMap<String, String>,
    file_analyses: HashMap<(String, String), analysis_core::FileAnalysis>,
    issues: Vec<analysis_core::Issue>,
}

/// In-memory stand-in for `repository_store::PgRepository`. Mirrors the
/// real store's two load-bearing invariants: a unique `(task_id)` per
/// PRAnalysis (modeled as an insert failure on a second attempt, same as
/// the real unique index rejecting a concurrent insert) and Issue
/// dedup-on-conflict keyed the same way as the Postgres partial index.
struct FakeRepository {
    state: Mutex<FakeRepositoryState>,
}

impl FakeRepository {
    fn new() -> Self {
        Self {
            state: Mutex::new(FakeRepositoryState::default()),
        }
    }

    async fn insert_task(&self, task: &Task) {
        self.state.lock().await.tasks.insert(task.id.clone(), task.clone());
    }

    async fn pr_analysis_count_for(&self, task_id: &str) -> usize {
        let st = self.state.lock().await;
        st.pr_by_task.values().filter(|id| st.pr_analyses.get(*id).map(|p| p.task_id == task_id).unwrap_or(false)).count()
    }

    async fn files_for(&self, pr_analysis_id: &str) -> Vec<analysis_core::FileAnalysis> {
        self.state
            .lock()
            .await
            .file_analyses
            .values()
            .filter(|f| f.pr_analysis_id == pr_analysis_id)
            .cloned()
            .collect()
    }

    async fn issues_for(&self, pr_analysis_id: &str) -> Vec<analysis_core::Issue> {
        self.state
            .lock()
            .await
            .issues
            .iter()
            .filter(|i| i.pr_analysis_id == pr_analysis_id)
            .cloned()
            .collect()
    }
}

impl Repository for FakeRepository {
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, AnalysisError> {
        Ok(self.state.lock().await.tasks.get(task_id).cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<(), AnalysisError> {
        self.state.lock().await.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get_pr_analysis_by_task_id(&self, task_id: &str) -> Result<Option<PrAnalysis>, AnalysisError> {
        let st = self.state.lock().await;
        Ok(st
            .pr_by_task
            .get(task_id)
            .and_then(|id| st.pr_analyses.get(id))
            .cloned())
    }

    async fn insert_pr_analysis(&self, pr: &PrAnalysis) -> Result<(), AnalysisError> {
        let mut st = self.state.lock().await;
        if st.pr_by_task.contains_key(&pr.task_id) {
            return Err(AnalysisError::Database(format!(
                "duplicate pr_analysis for task {}",
                pr.task_id
            )));
        }
        st.pr_by_task.insert(pr.task_id.clone(), pr.id.clone());
        st.pr_analyses.insert(pr.id.clone(), pr.clone());
        Ok(())
    }

    async fn update_pr_analysis(&self, pr: &PrAnalysis) -> Result<(), AnalysisError> {
        self.state.lock().await.pr_analyses.insert(pr.id.clone(), pr.clone());
        Ok(())
    }

    async fn insert_file_analysis(
        &self,
        file_analysis: &analysis_core::FileAnalysis,
        issues: &[analysis_core::Issue],
    ) -> Result<(), AnalysisError> {
        let mut st = self.state.lock().await;
        st.file_analyses.insert(
            (file_analysis.pr_analysis_id.clone(), file_analysis.file_path.clone()),
            file_analysis.clone(),
        );
        for issue in issues {
            let duplicate = st.issues.iter().any(|existing| {
                existing.pr_analysis_id == issue.pr_analysis_id
                    && existing.issue_type == issue.issue_type
                    && existing.file_path == issue.file_path
                    && existing.line == issue.line
                    && existing.rule_id == issue.rule_id
                    && existing.title == issue.title
            });
            if !duplicate {
                st.issues.push(issue.clone());
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct FakeQueueState {
    terminal: Vec<(String, TerminalOutcome)>,
}

struct FakeQueue {
    state: Mutex<FakeQueueState>,
}

impl FakeQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(FakeQueueState::default()),
        }
    }

    async fn terminal_outcomes(&self) -> Vec<(String, TerminalOutcome)> {
        self.state.lock().await.terminal.clone()
    }
}

impl Queue for FakeQueue {
    async fn update_progress(&self, _ticket_id: &str, _payload: serde_json::Value) -> Result<(), AnalysisError> {
        Ok(())
    }

    async fn mark_terminal(
        &self,
        ticket_id: &str,
        outcome: TerminalOutcome,
        _info: serde_json::Value,
    ) -> Result<(), AnalysisError> {
        self.state.lock().await.terminal.push((ticket_id.to_string(), outcome));
        Ok(())
    }
}

/// S1: a PR with no changed files completes with the zero-file default
/// score (75) and the default "looks good" recommendation.
#[tokio::test]
async fn empty_pr_completes_with_default_score() {
    let repo = Arc::new(FakeRepository::new());
    let queue = Arc::new(FakeQueue::new());
    let code_host = Arc::new(FakeCodeHost::new(pull_request(1), Vec::new()));

    let task = new_task(1);
    let task_id = task.id.clone();
    repo.insert_task(&task).await;

    let deps = Arc::new(analysis_core::WorkerDeps {
        repo: repo.clone(),
        queue: queue.clone(),
        code_host,
        llm: degraded_llm(),
        embeddings: unreachable_embeddings(),
    });

    run_task_with_retries(&deps, &task_id, "ticket-1").await;

    let task = repo.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.progress, 100);

    let pr = repo.get_pr_analysis_by_task_id(&task_id).await.unwrap().unwrap();
    assert_eq!(pr.status, PrAnalysisStatus::Completed);
    assert_eq!(pr.files_analyzed, 0);
    let scores = pr.scores.expect("completed analysis always carries scores");
    assert_eq!(scores.quality, 75.0);
    assert_eq!(
        pr.recommendations,
        vec!["Code looks good! Consider adding tests if not present".to_string()]
    );

    assert_eq!(
        queue.terminal_outcomes().await,
        vec![("ticket-1".to_string(), TerminalOutcome::Success)]
    );
}

/// S2: a critical security finding forces the PR to `needs_work` with a
/// recommendation naming the critical count. Drives the LLM client
/// through a mocked backend so the quality/security responses (and the
/// resulting score) are fully controlled.
#[tokio::test]
async fn critical_security_issue_forces_needs_work() {
    let mut server = mockito::Server::new_async().await;

    let _quality_mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::Regex("senior .* code reviewer".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices":[{"message":{"content":"{\"score\":8,\"issues\":[],\"suggestions\":[],\"metrics\":{\"maintainability\":9,\"readability\":8,\"complexity\":3}}"}}]}"#,
        )
        .create_async()
        .await;

    let _security_mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::Regex("security-focused .* code auditor".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices":[{"message":{"content":"[{\"type\":\"security\",\"severity\":\"critical\",\"title\":\"SQL injection via unsanitized input\",\"description\":\"User input concatenated directly into a query string.\",\"line\":42,\"recommendation\":\"Use parameterized queries\"}]"}}]}"#,
        )
        .create_async()
        .await;

    let _suggestions_mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::Regex("code improvement assistant".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"content":"[]"}}]}"#)
        .create_async()
        .await;

    let llm = Arc::new(
        LlmClient::new(LlmConfig {
            base_url: server.url(),
            api_key: Some("test-key".to_string()),
            model: "test-model".to_string(),
            temperature: 0.1,
            max_tokens: 256,
        })
        .unwrap(),
    );

    let repo = Arc::new(FakeRepository::new());
    let queue = Arc::new(FakeQueue::new());
    let code_host = Arc::new(
        FakeCodeHost::new(pull_request(2), vec![pr_file("src/db.rs")])
            .with_content("src/db.rs", "fn query(input: &str) { exec(input) }"),
    );

    let task = new_task(2);
    let task_id = task.id.clone();
    repo.insert_task(&task).await;

    let deps = Arc::new(analysis_core::WorkerDeps {
        repo: repo.clone(),
        queue: queue.clone(),
        code_host,
        llm,
        embeddings: unreachable_embeddings(),
    });

    run_task_with_retries(&deps, &task_id, "ticket-2").await;

    let task = repo.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    let pr = repo.get_pr_analysis_by_task_id(&task_id).await.unwrap().unwrap();
    assert_eq!(pr.status, PrAnalysisStatus::Completed);
    assert_eq!(pr.severity_counts.critical, 1);
    assert!(pr
        .recommendations
        .iter()
        .any(|r| r.contains("Address 1 critical security issues immediately")));

    let files = repo.files_for(&pr.id).await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].security_score, 60);
}

/// S3: a large PR (>20 files) always carries the "Large PR" split
/// recommendation regardless of per-file scores.
#[tokio::test]
async fn large_pr_recommends_splitting() {
    let repo = Arc::new(FakeRepository::new());
    let queue = Arc::new(FakeQueue::new());

    let file_paths: Vec<String> = (0..25).map(|i| format!("src/mod_{i}.rs")).collect();
    let files: Vec<PrFile> = file_paths.iter().map(|p| pr_file(p)).collect();
    let mut code_host = FakeCodeHost::new(pull_request(3), files);
    for path in &file_paths {
        code_host = code_host.with_content(path, "fn noop() {}\n");
    }

    let task = new_task(3);
    let task_id = task.id.clone();
    repo.insert_task(&task).await;

    let deps = Arc::new(analysis_core::WorkerDeps {
        repo: repo.clone(),
        queue: queue.clone(),
        code_host: Arc::new(code_host),
        llm: degraded_llm(),
        embeddings: unreachable_embeddings(),
    });

    run_task_with_retries(&deps, &task_id, "ticket-3").await;

    let task = repo.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    let pr = repo.get_pr_analysis_by_task_id(&task_id).await.unwrap().unwrap();
    assert_eq!(pr.files_analyzed, 25);
    assert!(pr.recommendations.iter().any(|r| r.contains("Large PR")));
}

/// S4: the code host refusing auth is fatal and immediate — no retry,
/// task ends `failed`.
#[tokio::test]
async fn unauthorized_code_host_fails_the_task_without_retry() {
    let repo = Arc::new(FakeRepository::new());
    let queue = Arc::new(FakeQueue::new());
    let code_host = Arc::new(FakeCodeHost::unauthorized());

    let task = new_task(4);
    let task_id = task.id.clone();
    repo.insert_task(&task).await;

    let deps = Arc::new(analysis_core::WorkerDeps {
        repo: repo.clone(),
        queue: queue.clone(),
        code_host,
        llm: degraded_llm(),
        embeddings: unreachable_embeddings(),
    });

    run_task_with_retries(&deps, &task_id, "ticket-4").await;

    let task = repo.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.retry_count, 0);
    assert!(task.error_message.unwrap().contains("unauthorized"));

    assert!(repo.get_pr_analysis_by_task_id(&task_id).await.unwrap().is_none());

    assert_eq!(
        queue.terminal_outcomes().await,
        vec![("ticket-4".to_string(), TerminalOutcome::Failure)]
    );
}

/// S5: one file's content fetch panicking inside the per-file fan-out is
/// contained — the task still completes, and only the surviving files
/// get a persisted FileAnalysis row.
#[tokio::test]
async fn a_panicking_file_analysis_is_skipped_not_fatal() {
    let repo = Arc::new(FakeRepository::new());
    let queue = Arc::new(FakeQueue::new());
    let code_host = Arc::new(
        FakeCodeHost::new(
            pull_request(5),
            vec![pr_file("a.rs"), pr_file("b.rs"), pr_file("c.rs")],
        )
        .with_content("a.rs", "fn a() {}\n")
        .with_content("c.rs", "fn c() {}\n")
        .panicking_on("b.rs"),
    );

    let task = new_task(5);
    let task_id = task.id.clone();
    repo.insert_task(&task).await;

    let deps = Arc::new(analysis_core::WorkerDeps {
        repo: repo.clone(),
        queue: queue.clone(),
        code_host,
        llm: degraded_llm(),
        embeddings: unreachable_embeddings(),
    });

    run_task_with_retries(&deps, &task_id, "ticket-5").await;

    let task = repo.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    let pr = repo.get_pr_analysis_by_task_id(&task_id).await.unwrap().unwrap();
    assert_eq!(pr.files_analyzed, 2);
    let files = repo.files_for(&pr.id).await;
    let mut paths: Vec<&str> = files.iter().map(|f| f.file_path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["a.rs", "c.rs"]);
}

/// S6: a completed task redelivered (e.g. a visibility-timeout requeue
/// racing an already-landed ack) is a no-op — exactly one PRAnalysis row
/// and no duplicate Issue rows, satisfying the at-least-once invariant.
#[tokio::test]
async fn redelivery_of_a_completed_task_does_not_reanalyze() {
    let repo = Arc::new(FakeRepository::new());
    let queue = Arc::new(FakeQueue::new());
    let code_host = Arc::new(
        FakeCodeHost::new(pull_request(6), vec![pr_file("only.rs")])
            .with_content("only.rs", "fn only() {}\n"),
    );

    let task = new_task(6);
    let task_id = task.id.clone();
    repo.insert_task(&task).await;

    let deps = Arc::new(analysis_core::WorkerDeps {
        repo: repo.clone(),
        queue: queue.clone(),
        code_host,
        llm: degraded_llm(),
        embeddings: unreachable_embeddings(),
    });

    run_task_with_retries(&deps, &task_id, "ticket-6a").await;
    let pr_after_first = repo.get_pr_analysis_by_task_id(&task_id).await.unwrap().unwrap();
    assert_eq!(pr_after_first.status, PrAnalysisStatus::Completed);
    let issues_after_first = repo.issues_for(&pr_after_first.id).await;

    // Redelivered under a fresh ticket id, same task id.
    run_task_with_retries(&deps, &task_id, "ticket-6b").await;

    assert_eq!(repo.pr_analysis_count_for(&task_id).await, 1);
    let pr_after_second = repo.get_pr_analysis_by_task_id(&task_id).await.unwrap().unwrap();
    assert_eq!(pr_after_second.id, pr_after_first.id);
    let issues_after_second = repo.issues_for(&pr_after_second.id).await;
    assert_eq!(issues_after_second.len(), issues_after_first.len());

    assert_eq!(
        queue.terminal_outcomes().await,
        vec![
            ("ticket-6a".to_string(), TerminalOutcome::Success),
            ("ticket-6b".to_string(), TerminalOutcome::Success),
        ]
    );
}
