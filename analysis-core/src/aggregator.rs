//! PR Aggregator: reduces per-file results into a PR-level summary.

use chrono::{DateTime, Utc};

use crate::models::{FileAnalysis, Issue, PrScores, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallQuality {
    Excellent,
    Good,
    Fair,
    NeedsWork,
    /// Aggregation itself failed; the PR still closes as completed with
    /// this synthetic summary rather than failing the whole task.
    Unknown,
}

impl OverallQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallQuality::Excellent => "excellent",
            OverallQuality::Good => "good",
            OverallQuality::Fair => "fair",
            OverallQuality::NeedsWork => "needs_work",
            OverallQuality::Unknown => "unknown",
        }
    }
}

/// PR-level summary produced by the aggregator.
pub struct AggregateSummary {
    pub overall_quality: OverallQuality,
    pub overall_score: i32,
    pub total_files: u32,
    pub critical_issues: u32,
    pub security_issues: u32,
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// `overall_score = round(mean(file.quality_score))`, defaulting to 75
/// when there are no files.
const DEFAULT_SCORE_NO_FILES: i32 = 75;

/// Reduces a PR's `FileAnalysis` rows (and their issues) into the
/// PR-level summary.
pub fn aggregate(files: &[FileAnalysis], issues: &[Issue]) -> AggregateSummary {
    let total_files = files.len() as u32;

    let overall_score = if files.is_empty() {
        DEFAULT_SCORE_NO_FILES
    } else {
        let sum: i64 = files.iter().map(|f| f.quality_score as i64).sum();
        ((sum as f64) / (files.len() as f64)).round() as i32
    };

    let critical_issues = issues.iter().filter(|i| i.severity == Severity::Critical).count() as u32;
    let security_issues = issues
        .iter()
        .filter(|i| i.issue_type == crate::models::IssueType::Security)
        .count() as u32;

    let overall_quality = if critical_issues > 0 {
        OverallQuality::NeedsWork
    } else if overall_score >= 85 {
        OverallQuality::Excellent
    } else if overall_score >= 75 {
        OverallQuality::Good
    } else {
        OverallQuality::Fair
    };

    let mut recommendations = Vec::new();
    if critical_issues > 0 {
        recommendations.push(format!(
            "Address {critical_issues} critical security issues immediately"
        ));
    }
    if overall_score < 70 {
        recommendations.push("Refactor the most complex files before merging".to_string());
    }
    if total_files > 20 {
        recommendations.push("Large PR - consider breaking into smaller changes".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("Code looks good! Consider adding tests if not present".to_string());
    }

    AggregateSummary {
        overall_quality,
        overall_score,
        total_files,
        critical_issues,
        security_issues,
        recommendations,
        timestamp: Utc::now(),
    }
}

/// Builds the `PrScores` triple persisted alongside the summary: quality
/// is the aggregate score; maintainability/complexity are the means of
/// the per-file values.
pub fn scores_from_files(files: &[FileAnalysis], overall_score: i32) -> PrScores {
    if files.is_empty() {
        return PrScores {
            quality: overall_score as f32,
            maintainability: overall_score as f32,
            complexity: 0.0,
        };
    }
    let n = files.len() as f32;
    let maintainability = files.iter().map(|f| f.maintainability).sum::<f32>() / n;
    let complexity = files.iter().map(|f| f.complexity).sum::<f32>() / n;
    PrScores {
        quality: overall_score as f32,
        maintainability,
        complexity,
    }
}

/// The synthetic summary used when `aggregate` itself panics. Summary
/// generation failing is degraded, not fatal: the PRAnalysis still
/// closes as completed rather than failing the whole task.
pub fn degraded_summary() -> AggregateSummary {
    AggregateSummary {
        overall_quality: OverallQuality::Unknown,
        overall_score: DEFAULT_SCORE_NO_FILES,
        total_files: 0,
        critical_issues: 0,
        security_issues: 0,
        recommendations: vec!["Analysis summary generation failed".to_string()],
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_summary_reports_unknown_quality() {
        let summary = degraded_summary();
        assert_eq!(summary.overall_quality, OverallQuality::Unknown);
        assert_eq!(summary.overall_quality.as_str(), "unknown");
    }

    #[test]
    fn zero_files_defaults_to_75_and_fair() {
        let summary = aggregate(&[], &[]);
        assert_eq!(summary.overall_score, 75);
        assert_eq!(summary.overall_quality, OverallQuality::Fair);
        assert_eq!(
            summary.recommendations,
            vec!["Code looks good! Consider adding tests if not present".to_string()]
        );
    }

    #[test]
    fn critical_issue_forces_needs_work_and_recommendation() {
        let issue = Issue {
            id: "i1".into(),
            pr_analysis_id: "p1".into(),
            file_analysis_id: None,
            issue_type: crate::models::IssueType::Security,
            severity: Severity::Critical,
            file_path: None,
            line: None,
            column: None,
            title: "sql injection".into(),
            description: "d".into(),
            code_snippet: None,
            suggestion: None,
            suggested_replacement: None,
            rule_id: None,
            tool_name: None,
            confidence: 0.9,
            tags: vec![],
            reference_urls: vec![],
        };
        let summary = aggregate(&[], std::slice::from_ref(&issue));
        assert_eq!(summary.overall_quality, OverallQuality::NeedsWork);
        assert!(summary.recommendations[0].contains("Address 1 critical"));
    }

    #[test]
    fn over_twenty_files_recommends_splitting() {
        let files: Vec<FileAnalysis> = (0..25)
            .map(|i| make_clean_file(&format!("f{i}.rs")))
            .collect();
        let summary = aggregate(&files, &[]);
        assert!(summary.recommendations.iter().any(|r| r.contains("Large PR")));
    }

    fn make_clean_file(path: &str) -> FileAnalysis {
        let now = Utc::now();
        FileAnalysis {
            id: "f".into(),
            pr_analysis_id: "p".into(),
            file_path: path.into(),
            file_name: path.into(),
            file_extension: None,
            detected_language: "rust".into(),
            lines_total: 10,
            lines_analyzed: 10,
            lines_added: 5,
            lines_removed: 0,
            analysis_status: crate::models::FileAnalysisStatus::Completed,
            quality_score: 90,
            security_score: 100,
            complexity: 2.0,
            maintainability: 90.0,
            issues_count: 0,
            critical_issues_count: 0,
            recommendations: vec![],
            raw_diff: None,
            tools_run: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}
