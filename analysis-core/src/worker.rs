//! Task Worker: the orchestrator. Claims a task, drives it through
//! PR fetch → per-file fan-out → aggregation → persistence, emitting
//! progress at each stage boundary and honoring retries, cancellation,
//! and idempotency.

use std::sync::Arc;
use std::time::Duration;

use code_host::GitHubClient;
use embeddings_engine::EmbeddingEngine;
use llm_client::LlmClient;
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::aggregator::{aggregate, degraded_summary, scores_from_files};
use crate::analyzer::{analyze_file, FileChange};
use crate::errors::AnalysisError;
use crate::models::{PrAnalysis, PrScores, Task, TaskStatus};
use crate::ports::{CodeHost, Queue, Repository, TerminalOutcome};

/// Wall-clock budget for a single task attempt.
const TASK_TIMEOUT: Duration = Duration::from_secs(600);
/// Base delay before a retry attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(60);
/// Upper bound on concurrent per-file analyses.
const MAX_FAN_OUT: usize = 8;

/// Dependencies the worker needs for one task run. Grouped so
/// `run_task_with_retries` doesn't take an unwieldy parameter list.
pub struct WorkerDeps<R: Repository, Q: Queue, H: CodeHost = GitHubClient> {
    pub repo: Arc<R>,
    pub queue: Arc<Q>,
    pub code_host: Arc<H>,
    pub llm: Arc<LlmClient>,
    pub embeddings: Arc<EmbeddingEngine>,
}

/// Drives one task from `pending`/`retry` to a terminal state, retrying
/// internally up to `max_retries` times on non-fatal failures.
pub async fn run_task_with_retries<R: Repository, Q: Queue, H: CodeHost>(
    deps: &WorkerDeps<R, Q, H>,
    task_id: &str,
    ticket_id: &str,
) {
    loop {
        let Some(mut task) = (match deps.repo.get_task(task_id).await {
            Ok(t) => t,
            Err(e) => {
                error!(task_id, error = %e, "failed to load task, abandoning run");
                return;
            }
        }) else {
            warn!(task_id, "task not found, nothing to run");
            return;
        };

        if task.status == TaskStatus::Cancelled {
            info!(task_id, "task already cancelled, skipping");
            return;
        }

        match run_task_once(deps, &mut task).await {
            Ok(()) => {
                let _ = deps
                    .queue
                    .mark_terminal(ticket_id, TerminalOutcome::Success, json!({}))
                    .await;
                return;
            }
            Err(e) if e.is_task_fatal() => {
                task.mark_failed(e.to_string(), None);
                let _ = deps.repo.update_task(&task).await;
                let _ = deps
                    .queue
                    .mark_terminal(ticket_id, TerminalOutcome::Failure, json!({"error": e.to_string()}))
                    .await;
                error!(task_id, error = %e, "task failed fatally, no retry");
                return;
            }
            Err(e) => {
                let retried = match e.retry_cap() {
                    Some(cap) => task.try_retry_capped(cap),
                    None => task.try_retry(),
                };
                if retried {
                    let _ = deps.repo.update_task(&task).await;
                    let _ = deps
                        .queue
                        .mark_terminal(ticket_id, TerminalOutcome::Retry, json!({"error": e.to_string()}))
                        .await;
                    warn!(
                        task_id,
                        retry_count = task.retry_count,
                        error = %e,
                        "task failed, scheduling retry"
                    );
                    tokio::time::sleep(RETRY_BASE_DELAY).await;
                    task.mark_processing();
                    let _ = deps.repo.update_task(&task).await;
                    continue;
                }
                task.mark_failed(e.to_string(), None);
                let _ = deps.repo.update_task(&task).await;
                let _ = deps
                    .queue
                    .mark_terminal(ticket_id, TerminalOutcome::Failure, json!({"error": e.to_string()}))
                    .await;
                error!(task_id, error = %e, "task failed, retries exhausted");
                return;
            }
        }
    }
}

async fn run_task_once<R: Repository, Q: Queue, H: CodeHost>(
    deps: &WorkerDeps<R, Q, H>,
    task: &mut Task,
) -> Result<(), AnalysisError> {
    tokio::time::timeout(TASK_TIMEOUT, run_stages(deps, task))
        .await
        .unwrap_or(Err(AnalysisError::TaskTimeout))
}

async fn run_stages<R: Repository, Q: Queue, H: CodeHost>(
    deps: &WorkerDeps<R, Q, H>,
    task: &mut Task,
) -> Result<(), AnalysisError> {
    // --- initializing (0) ---
    let existing = deps.repo.get_pr_analysis_by_task_id(&task.id).await?;
    if let Some(pr) = &existing {
        if matches!(pr.status, crate::models::PrAnalysisStatus::Completed) {
            // Idempotency: a terminal PRAnalysis already exists for this
            // task id. Re-delivery should not repeat the work.
            info!(task_id = %task.id, "pr analysis already completed, acking without rework");
            task.mark_completed();
            deps.repo.update_task(task).await?;
            return Ok(());
        }
    }

    task.mark_processing();
    deps.repo.update_task(task).await?;
    report_progress(deps, task, 0).await;

    if task_cancelled(deps, task).await? {
        return Ok(());
    }

    // --- fetching_pr_data (10) ---
    // No PRAnalysis row exists yet on a fresh task. It's created below
    // only once the PR fetch succeeds, so a fatal failure here (e.g. the
    // code host refusing auth) leaves no row behind.
    report_progress(deps, task, 10).await;
    let repo_ref = code_host::RepoRef {
        owner: task.repo_owner.clone(),
        name: task.repo_name.clone(),
    };
    let pr_meta = deps
        .code_host
        .get_pull_request(&repo_ref, task.pr_number)
        .await?;
    let files = deps.code_host.get_pr_files(&repo_ref, task.pr_number).await?;

    let mut pr_analysis = match existing {
        Some(pr) => pr, // adopt an in-progress analysis from a prior attempt
        None => {
            let pr = PrAnalysis::new(
                Uuid::new_v4().to_string(),
                task.id.clone(),
                task.repo_url.clone(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            );
            deps.repo.insert_pr_analysis(&pr).await?;
            pr
        }
    };
    pr_analysis.mark_in_progress();
    pr_analysis.base_branch = pr_meta.base_branch.clone();
    pr_analysis.head_branch = pr_meta.head_branch.clone();
    pr_analysis.base_sha = pr_meta.base_sha.clone();
    pr_analysis.head_sha = pr_meta.head_sha.clone();
    deps.repo.update_pr_analysis(&pr_analysis).await?;

    if task_cancelled(deps, task).await? {
        return Ok(());
    }

    // --- analyzing_files (30..80) ---
    let semaphore = Arc::new(Semaphore::new(MAX_FAN_OUT.min(files.len().max(1))));
    let mut handles = Vec::with_capacity(files.len());
    let total = files.len().max(1);

    for (idx, file) in files.into_iter().enumerate() {
        let permit = semaphore.clone();
        let code_host = deps.code_host.clone();
        let llm = deps.llm.clone();
        let embeddings = deps.embeddings.clone();
        let pr_id = pr_analysis.id.clone();
        let repo_ref = repo_ref.clone();
        let head_sha = pr_analysis.head_sha.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit.acquire_owned().await;
            let content = code_host
                .get_file_content(&repo_ref, &file.path, &head_sha)
                .await
                .unwrap_or_default();
            let change = FileChange {
                file_path: file.path.clone(),
                content,
                raw_diff: file.patch.clone(),
                lines_added: file.additions as u32,
                lines_removed: file.deletions as u32,
            };
            let (fa, issues) = analyze_file(&llm, &embeddings, &pr_id, &change).await;
            (idx, file.path, fa, issues)
        }));
    }

    let mut all_files = Vec::new();
    let mut all_issues = Vec::new();
    for (completed, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok((_idx, _path, fa, issues)) => {
                deps.repo.insert_file_analysis(&fa, &issues).await?;
                all_issues.extend(issues);
                all_files.push(fa);
            }
            Err(join_err) => {
                // A single file's analysis panicking is logged and
                // skipped; the worker proceeds per the partial-failure
                // semantics.
                warn!(task_id = %task.id, error = %join_err, "file analysis task panicked, skipping");
            }
        }
        let fraction = (completed + 1) as f32 / total as f32;
        let progress = 30 + (fraction * 50.0) as u8;
        report_progress(deps, task, progress.min(80)).await;

        if task_cancelled(deps, task).await? {
            return Ok(());
        }
    }

    // --- generating_summary (85) ---
    report_progress(deps, task, 85).await;
    let summary = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| aggregate(&all_files, &all_issues)))
        .unwrap_or_else(|_| {
            warn!(task_id = %task.id, "summary generation panicked, using degraded summary");
            degraded_summary()
        });

    // --- saving_results (95) ---
    report_progress(deps, task, 95).await;
    let scores = PrScores {
        quality: scores_from_files(&all_files, summary.overall_score).quality,
        maintainability: scores_from_files(&all_files, summary.overall_score).maintainability,
        complexity: scores_from_files(&all_files, summary.overall_score).complexity,
    };

    let mut severity_counts = crate::models::SeverityCounts::default();
    for issue in &all_issues {
        match issue.severity {
            crate::models::Severity::Critical => severity_counts.critical += 1,
            crate::models::Severity::High => severity_counts.high += 1,
            crate::models::Severity::Medium => severity_counts.medium += 1,
            crate::models::Severity::Low => severity_counts.low += 1,
            crate::models::Severity::Info => severity_counts.info += 1,
        }
    }
    pr_analysis.set_severity_counts(severity_counts);
    // `files_analyzed` counts successful FileAnalysis rows, not files
    // changed in the PR — a file that panics during analysis doesn't
    // count.
    pr_analysis.files_analyzed = all_files.len() as u32;
    pr_analysis.lines_analyzed = all_files.iter().map(|f| f.lines_analyzed).sum();
    pr_analysis.mark_completed(
        scores,
        format!(
            "{} files analyzed, {} issues found",
            all_files.len(),
            all_issues.len()
        ),
        summary.recommendations,
    );
    deps.repo.update_pr_analysis(&pr_analysis).await?;

    // --- completed (100) ---
    task.mark_completed();
    deps.repo.update_task(task).await?;
    report_progress(deps, task, 100).await;

    Ok(())
}

async fn report_progress<R: Repository, Q: Queue, H: CodeHost>(deps: &WorkerDeps<R, Q, H>, task: &mut Task, progress: u8) {
    task.set_progress(progress);
    if let Err(e) = deps.repo.update_task(task).await {
        warn!(task_id = %task.id, error = %e, "failed to persist progress update");
    }
    if let Some(ticket) = &task.queue_ticket_id {
        let _ = deps
            .queue
            .update_progress(ticket, json!({"progress": progress}))
            .await;
    }
}

/// Polls the persisted task status for an externally-observed
/// cancellation. Cancellation is advisory and only honored at stage
/// boundaries.
async fn task_cancelled<R: Repository, Q: Queue, H: CodeHost>(
    deps: &WorkerDeps<R, Q, H>,
    task: &mut Task,
) -> Result<bool, AnalysisError> {
    let Some(current) = deps.repo.get_task(&task.id).await? else {
        return Ok(false);
    };
    if current.status == TaskStatus::Cancelled {
        task.status = TaskStatus::Cancelled;
        info!(task_id = %task.id, "cancellation observed at stage boundary, aborting");
        return Ok(true);
    }
    Ok(false)
}
