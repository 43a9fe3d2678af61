//! Maps `sqlx::Error` onto the core error taxonomy.

use analysis_core::AnalysisError;

pub fn map_sqlx_error(err: sqlx::Error) -> AnalysisError {
    match err {
        sqlx::Error::RowNotFound => AnalysisError::NotFound("row not found".to_string()),
        other => AnalysisError::Database(other.to_string()),
    }
}
