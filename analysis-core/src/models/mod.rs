pub mod file_analysis;
pub mod issue;
pub mod pr_analysis;
pub mod task;

pub use file_analysis::{FileAnalysis, FileAnalysisStatus};
pub use issue::{Issue, IssueType, Severity};
pub use pr_analysis::{PrAnalysis, PrAnalysisStatus, PrScores, SeverityCounts};
pub use task::{Task, TaskPriority, TaskStatus};
