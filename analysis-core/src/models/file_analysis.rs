//! The `FileAnalysis` entity: the result of analyzing one changed file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAnalysisStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub id: String,
    pub pr_analysis_id: String,
    pub file_path: String,
    pub file_name: String,
    pub file_extension: Option<String>,
    pub detected_language: String,
    pub lines_total: u32,
    pub lines_analyzed: u32,
    pub lines_added: u32,
    pub lines_removed: u32,
    pub analysis_status: FileAnalysisStatus,
    pub quality_score: i32,
    pub security_score: i32,
    pub complexity: f32,
    pub maintainability: f32,
    pub issues_count: u32,
    pub critical_issues_count: u32,
    pub recommendations: Vec<String>,
    pub raw_diff: Option<String>,
    pub tools_run: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileAnalysis {
    /// Derives `file_name`/`file_extension` from `file_path`, matching the
    /// language-detection step's path handling.
    pub fn path_parts(file_path: &str) -> (String, Option<String>) {
        let file_name = file_path
            .rsplit('/')
            .next()
            .unwrap_or(file_path)
            .to_string();
        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_string());
        (file_name, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parts_splits_name_and_extension() {
        let (name, ext) = FileAnalysis::path_parts("src/worker/mod.rs");
        assert_eq!(name, "mod.rs");
        assert_eq!(ext.as_deref(), Some("rs"));
    }

    #[test]
    fn path_parts_handles_no_extension() {
        let (name, ext) = FileAnalysis::path_parts("Makefile");
        assert_eq!(name, "Makefile");
        assert_eq!(ext, None);
    }
}
