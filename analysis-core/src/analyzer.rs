//! File Analyzer: runs the LLM and embeddings analyses for one
//! changed file and reduces them into a `FileAnalysis` plus its `Issue`s.

use chrono::Utc;
use embeddings_engine::EmbeddingEngine;
use llm_client::LlmClient;
use uuid::Uuid;

use crate::models::{FileAnalysis, FileAnalysisStatus, Issue, IssueType, Severity};

/// One changed file as the worker hands it to the analyzer: the diff
/// metadata plus the file's full content at the PR head.
pub struct FileChange {
    pub file_path: String,
    pub content: String,
    pub raw_diff: Option<String>,
    pub lines_added: u32,
    pub lines_removed: u32,
}

/// Guesses a language name from a file extension, from path only
/// (best-effort; content-based detection is not attempted).
pub fn detect_language(file_path: &str) -> String {
    let ext = file_path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("js") => "javascript",
        Some("ts") | Some("tsx") => "typescript",
        Some("go") => "go",
        Some("java") => "java",
        Some("rb") => "ruby",
        Some("c") | Some("h") => "c",
        Some("cpp") | Some("cc") | Some("hpp") => "cpp",
        Some("cs") => "csharp",
        Some("php") => "php",
        Some("kt") => "kotlin",
        Some("swift") => "swift",
        _ => "plaintext",
    }
    .to_string()
}

/// Runs the full per-file analysis algorithm.
pub async fn analyze_file(
    llm: &LlmClient,
    embeddings: &EmbeddingEngine,
    pr_analysis_id: &str,
    change: &FileChange,
) -> (FileAnalysis, Vec<Issue>) {
    let language = detect_language(&change.file_path);

    // Launch the three LLM analyses and the embeddings metrics
    // concurrently; all four are independent suspension points.
    let (quality, security_issues, suggestions, similarity) = tokio::join!(
        llm.analyze_quality(&change.content, &change.file_path, &language),
        llm.analyze_security(&change.content, &change.file_path, &language),
        llm.generate_suggestions(&change.content, &change.file_path, &language),
        embeddings.similarity_metrics(&change.content),
    );

    // Merge quality issues with security issues into one list.
    let mut raw_issues = quality.issues;
    raw_issues.extend(security_issues.iter().cloned());

    // Normalize type/severity taxonomies and materialize Issue rows.
    let (file_analysis_id, now) = (Uuid::new_v4().to_string(), Utc::now());
    let issues: Vec<Issue> = raw_issues
        .into_iter()
        .map(|raw| {
            Issue {
                id: Uuid::new_v4().to_string(),
                pr_analysis_id: pr_analysis_id.to_string(),
                file_analysis_id: Some(file_analysis_id.clone()),
                issue_type: IssueType::normalize(&raw.issue_type),
                severity: Severity::normalize(&raw.severity),
                file_path: Some(change.file_path.clone()),
                line: raw.line,
                column: None,
                title: raw.title,
                description: raw.description,
                code_snippet: None,
                suggestion: raw.recommendation,
                suggested_replacement: None,
                rule_id: None,
                tool_name: Some("llm-client".to_string()),
                confidence: 0.7,
                tags: Vec::new(),
                reference_urls: Vec::new(),
            }
            .with_title_clamped()
        })
        .collect();

    // Compute quality_score and security_score.
    let critical_or_high = issues.iter().filter(|i| i.severity.is_critical_or_high()).count() as i32;
    let high = issues.iter().filter(|i| i.severity == Severity::High).count() as i32;
    let medium = issues.iter().filter(|i| i.severity == Severity::Medium).count() as i32;

    // `maintainability`/`complexity` arrive on a 0..10 scale from the LLM;
    // the scoring formula below operates on a 0..100 base, so both are
    // rescaled by 10 before the deductions are applied.
    let maintainability_100 = quality.metrics.maintainability * 10.0;
    let complexity_100 = quality.metrics.complexity * 10.0;

    let mut quality_base = maintainability_100;
    quality_base -= 20.0 * critical_or_high as f32;
    quality_base -= 10.0 * high as f32;
    quality_base -= 5.0 * medium as f32;
    if complexity_100 > 15.0 {
        quality_base -= 2.0 * (complexity_100 - 15.0);
    }
    quality_base -= (similarity.duplication_score * 30.0).round();
    let quality_score = quality_base.clamp(0.0, 100.0).round() as i32;

    let security_only: Vec<&Issue> = issues.iter().filter(|i| i.issue_type == IssueType::Security).collect();
    let security_score = if security_only.is_empty() {
        100
    } else {
        let sec_critical_or_high = security_only.iter().filter(|i| i.severity.is_critical_or_high()).count() as i32;
        let sec_high = security_only.iter().filter(|i| i.severity == Severity::High).count() as i32;
        let sec_medium = security_only.iter().filter(|i| i.severity == Severity::Medium).count() as i32;
        let mut s = 100.0;
        s -= 40.0 * sec_critical_or_high as f32;
        s -= 25.0 * sec_high as f32;
        s -= 10.0 * sec_medium as f32;
        s.clamp(0.0, 100.0).round() as i32
    };

    let critical_issues_count = issues.iter().filter(|i| i.severity == Severity::Critical).count() as u32;
    let (file_name, file_extension) = FileAnalysis::path_parts(&change.file_path);
    let lines_total = change.content.lines().count() as u32;

    let mut recommendations: Vec<String> = quality.suggestions;
    recommendations.extend(suggestions.into_iter().map(|s| s.title));

    let file_analysis = FileAnalysis {
        id: file_analysis_id,
        pr_analysis_id: pr_analysis_id.to_string(),
        file_path: change.file_path.clone(),
        file_name,
        file_extension,
        detected_language: language,
        lines_total,
        lines_analyzed: lines_total,
        lines_added: change.lines_added,
        lines_removed: change.lines_removed,
        analysis_status: FileAnalysisStatus::Completed,
        quality_score,
        security_score,
        complexity: complexity_100,
        maintainability: maintainability_100,
        issues_count: issues.len() as u32,
        critical_issues_count,
        recommendations,
        raw_diff: change.raw_diff.clone(),
        tools_run: vec!["llm-client".to_string(), "embeddings-engine".to_string()],
        created_at: now,
        updated_at: now,
    };

    (file_analysis, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_language_from_extension() {
        assert_eq!(detect_language("src/main.rs"), "rust");
        assert_eq!(detect_language("script.py"), "python");
        assert_eq!(detect_language("README"), "plaintext");
    }

    #[tokio::test]
    async fn degraded_backends_still_produce_a_file_analysis() {
        let llm = LlmClient::new(llm_client::LlmConfig {
            base_url: "https://example.invalid".into(),
            api_key: None,
            model: "m".into(),
            temperature: 0.1,
            max_tokens: 100,
        })
        .unwrap();
        let embeddings = EmbeddingEngine::new(embeddings_engine::EmbeddingConfig::default());

        let change = FileChange {
            file_path: "src/lib.rs".to_string(),
            content: "fn main() {}".to_string(),
            raw_diff: None,
            lines_added: 1,
            lines_removed: 0,
        };

        let (fa, issues) = analyze_file(&llm, &embeddings, "pr1", &change).await;
        assert_eq!(fa.analysis_status, FileAnalysisStatus::Completed);
        assert!(!issues.is_empty());
    }
}
