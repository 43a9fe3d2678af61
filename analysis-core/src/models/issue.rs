//! The `Issue` entity: one finding, either PR-scoped or file-scoped.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Style,
    Bug,
    Performance,
    Security,
    BestPractice,
    Complexity,
    Maintainability,
    Documentation,
}

impl IssueType {
    /// Normalizes an arbitrary incoming type string: unknown→bug,
    /// error→bug, warning→best_practice, info→style,
    /// quality→maintainability. Recognized enum names pass through.
    pub fn normalize(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "style" => IssueType::Style,
            "bug" | "error" => IssueType::Bug,
            "performance" => IssueType::Performance,
            "security" => IssueType::Security,
            "best_practice" | "warning" => IssueType::BestPractice,
            "complexity" => IssueType::Complexity,
            "maintainability" | "quality" => IssueType::Maintainability,
            "documentation" => IssueType::Documentation,
            "info" => IssueType::Style,
            _ => IssueType::Bug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Normalizes an arbitrary incoming severity string: error→high,
    /// warning→medium, info→low; unknown→low.
    pub fn normalize(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "info" => Severity::Info,
            "low" => Severity::Low,
            "medium" | "warning" => Severity::Medium,
            "high" | "error" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Low,
        }
    }

    pub fn is_critical_or_high(self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

/// One finding, always attached to a PRAnalysis and optionally to a
/// specific FileAnalysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub pr_analysis_id: String,
    pub file_analysis_id: Option<String>,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub title: String,
    pub description: String,
    pub code_snippet: Option<String>,
    pub suggestion: Option<String>,
    pub suggested_replacement: Option<String>,
    pub rule_id: Option<String>,
    pub tool_name: Option<String>,
    pub confidence: f32,
    pub tags: Vec<String>,
    pub reference_urls: Vec<String>,
}

impl Issue {
    /// Title is truncated to 200 characters, per the `title (required,
    /// ≤200 chars)` invariant.
    pub fn with_title_clamped(mut self) -> Self {
        if self.title.chars().count() > 200 {
            self.title = self.title.chars().take(200).collect();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_unknown_type_to_bug() {
        assert_eq!(IssueType::normalize("totally_unknown"), IssueType::Bug);
        assert_eq!(IssueType::normalize("warning"), IssueType::BestPractice);
        assert_eq!(IssueType::normalize("quality"), IssueType::Maintainability);
    }

    #[test]
    fn normalizes_unknown_severity_to_low() {
        assert_eq!(Severity::normalize("nonsense"), Severity::Low);
        assert_eq!(Severity::normalize("error"), Severity::High);
        assert_eq!(Severity::normalize("warning"), Severity::Medium);
    }

    #[test]
    fn severity_ordering_places_critical_highest() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
    }
}
