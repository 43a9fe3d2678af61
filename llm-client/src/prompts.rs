//! Prompt construction, response shapes, and degraded-mode fallbacks for
//! the three chat-completion analyses.

use serde::{Deserialize, Serialize};

/// One finding surfaced by `analyze_quality` or `analyze_security`.
///
/// Shared across both analyses: quality findings usually omit
/// `recommendation`, security findings usually carry one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// One improvement surfaced by `generate_suggestions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRecord {
    #[serde(rename = "type")]
    pub suggestion_type: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub example: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub maintainability: f32,
    pub readability: f32,
    pub complexity: f32,
}

/// Result of `analyze_quality`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: f32,
    pub issues: Vec<IssueRecord>,
    pub suggestions: Vec<String>,
    pub metrics: QualityMetrics,
}

const DEGRADED_NOTE: &str = "LLM backend unavailable; analysis proceeded in degraded mode.";

/// A neutral midpoint score used both for degraded-mode responses and for
/// wrapped-raw-text fallbacks, where no real signal is available.
const NEUTRAL_SCORE: f32 = 5.0;

pub fn quality_system_prompt(language: &str) -> String {
    format!(
        "You are a senior {language} code reviewer focused on maintainability, \
         readability, and structural quality. Respond with a single JSON object: \
         {{\"score\": 0-10, \"issues\": [{{\"type\":str,\"severity\":str,\"title\":str,\
         \"description\":str,\"line\":int|null}}], \"suggestions\": [str], \
         \"metrics\": {{\"maintainability\":0-10,\"readability\":0-10,\"complexity\":0-10}}}}. \
         Output JSON only, no prose."
    )
}

pub fn quality_user_prompt(file_path: &str, file_content: &str) -> String {
    format!(
        "File: {file_path}\n\nReview this file for quality issues and score it.\n\n```\n{file_content}\n```"
    )
}

pub fn security_system_prompt(language: &str) -> String {
    format!(
        "You are a security-focused {language} code auditor. Respond with a single \
         JSON array of findings: [{{\"type\":str,\"severity\":str,\"title\":str,\
         \"description\":str,\"line\":int|null,\"recommendation\":str}}]. An empty \
         array means no findings. Output JSON only, no prose."
    )
}

pub fn security_user_prompt(file_path: &str, file_content: &str) -> String {
    format!(
        "File: {file_path}\n\nIdentify security vulnerabilities in this file.\n\n```\n{file_content}\n```"
    )
}

pub fn suggestions_system_prompt(language: &str) -> String {
    format!(
        "You are a {language} code improvement assistant. Respond with a single \
         JSON array: [{{\"type\":str,\"priority\":str,\"title\":str,\"description\":str,\
         \"line\":int|null,\"example\":str|null}}]. An empty array means no suggestions. \
         Output JSON only, no prose."
    )
}

pub fn suggestions_user_prompt(file_path: &str, file_content: &str) -> String {
    format!(
        "File: {file_path}\n\nSuggest concrete improvements for this file.\n\n```\n{file_content}\n```"
    )
}

/// Parses a quality response; on parse failure wraps the raw text into a
/// single-issue report so the analysis still produces a result.
pub fn parse_quality_response(raw: &str) -> QualityReport {
    match serde_json::from_str::<QualityReport>(raw) {
        Ok(v) => v,
        Err(_) => QualityReport {
            score: NEUTRAL_SCORE,
            issues: vec![IssueRecord {
                issue_type: "maintainability".into(),
                severity: "info".into(),
                title: "unparsed model response".into(),
                description: raw.to_string(),
                line: None,
                recommendation: None,
            }],
            suggestions: Vec::new(),
            metrics: QualityMetrics {
                maintainability: NEUTRAL_SCORE,
                readability: NEUTRAL_SCORE,
                complexity: NEUTRAL_SCORE,
            },
        },
    }
}

/// Parses a security response; on parse failure wraps the raw text into a
/// single finding.
pub fn parse_security_response(raw: &str) -> Vec<IssueRecord> {
    match serde_json::from_str::<Vec<IssueRecord>>(raw) {
        Ok(v) => v,
        Err(_) => vec![IssueRecord {
            issue_type: "security".into(),
            severity: "info".into(),
            title: "unparsed model response".into(),
            description: raw.to_string(),
            line: None,
            recommendation: None,
        }],
    }
}

/// Parses a suggestions response; on parse failure wraps the raw text into
/// a single suggestion.
pub fn parse_suggestions_response(raw: &str) -> Vec<SuggestionRecord> {
    match serde_json::from_str::<Vec<SuggestionRecord>>(raw) {
        Ok(v) => v,
        Err(_) => vec![SuggestionRecord {
            suggestion_type: "general".into(),
            priority: "low".into(),
            title: "unparsed model response".into(),
            description: raw.to_string(),
            line: None,
            example: None,
        }],
    }
}

/// Canned quality response returned when the client is in degraded mode.
pub fn degraded_quality_report() -> QualityReport {
    QualityReport {
        score: NEUTRAL_SCORE,
        issues: vec![IssueRecord {
            issue_type: "best_practice".into(),
            severity: "info".into(),
            title: "degraded mode".into(),
            description: DEGRADED_NOTE.into(),
            line: None,
            recommendation: None,
        }],
        suggestions: Vec::new(),
        metrics: QualityMetrics {
            maintainability: NEUTRAL_SCORE,
            readability: NEUTRAL_SCORE,
            complexity: NEUTRAL_SCORE,
        },
    }
}

/// Canned security response returned when the client is in degraded mode.
pub fn degraded_security_issues() -> Vec<IssueRecord> {
    vec![IssueRecord {
        issue_type: "security".into(),
        severity: "info".into(),
        title: "degraded mode".into(),
        description: DEGRADED_NOTE.into(),
        line: None,
        recommendation: None,
    }]
}

/// Canned suggestions response returned when the client is in degraded mode.
pub fn degraded_suggestions() -> Vec<SuggestionRecord> {
    vec![SuggestionRecord {
        suggestion_type: "general".into(),
        priority: "low".into(),
        title: "degraded mode".into(),
        description: DEGRADED_NOTE.into(),
        line: None,
        example: None,
    }]
}
