use serde::Serialize;

use analysis_core::{FileAnalysis, Issue, PrScores, SeverityCounts};

#[derive(Debug, Serialize)]
pub struct PrMetadata {
    pub pr_url: String,
    pub base_branch: String,
    pub head_branch: String,
    pub base_sha: String,
    pub head_sha: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub scores: Option<PrScores>,
    pub summary: Option<String>,
    pub recommendations: Vec<String>,
    pub issues_found: u32,
    pub severity_counts: SeverityCounts,
}

#[derive(Debug, Serialize)]
pub struct FileResult {
    pub file_path: String,
    pub detected_language: String,
    pub quality_score: i32,
    pub security_score: i32,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Serialize)]
pub struct ResultsMetadata {
    pub files_analyzed: u32,
    pub lines_analyzed: u32,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub task_id: String,
    pub status: String,
    pub pr_metadata: PrMetadata,
    pub summary: AnalysisSummary,
    pub files: Vec<FileResult>,
    pub metadata: ResultsMetadata,
}

pub fn build_file_results(files: Vec<FileAnalysis>, mut issues: Vec<Issue>) -> Vec<FileResult> {
    files
        .into_iter()
        .map(|f| {
            let (matched, rest): (Vec<Issue>, Vec<Issue>) = std::mem::take(&mut issues)
                .into_iter()
                .partition(|i| i.file_path.as_deref() == Some(f.file_path.as_str()));
            issues = rest;
            FileResult {
                file_path: f.file_path,
                detected_language: f.detected_language,
                quality_score: f.quality_score,
                security_score: f.security_score,
                issues: matched,
            }
        })
        .collect()
}
