//! Domain model and orchestration core for the PR analysis pipeline:
//! the Task/PRAnalysis/FileAnalysis/Issue entities, the File Analyzer
//! the PR Aggregator, and the Task Worker orchestrator.

pub mod aggregator;
pub mod analyzer;
pub mod errors;
pub mod models;
pub mod ports;
pub mod worker;

pub use errors::AnalysisError;
pub use models::{
    FileAnalysis, FileAnalysisStatus, Issue, IssueType, PrAnalysis, PrAnalysisStatus, PrScores,
    Severity, SeverityCounts, Task, TaskPriority, TaskStatus,
};
pub use ports::{CodeHost, Queue, Repository, TerminalOutcome};
pub use worker::{run_task_with_retries, WorkerDeps};
