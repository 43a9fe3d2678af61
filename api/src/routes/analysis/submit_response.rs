use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SubmitAnalysisResponse {
    pub task_id: String,
}
