use serde::Deserialize;

fn default_priority() -> String {
    "normal".to_string()
}

/// Request body for `POST /analysis`.
#[derive(Debug, Deserialize)]
pub struct SubmitAnalysisRequest {
    /// `https://github.com/<owner>/<repo>` or `git@github.com:<owner>/<repo>.git`.
    pub repo_url: String,
    pub pr_number: u64,
    /// Optional token overriding the worker's default code-host credentials.
    pub token: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub options: Option<serde_json::Value>,
}
