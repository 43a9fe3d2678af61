//! Postgres-backed implementation of the repository store: durable
//! persistence for Task/PRAnalysis/FileAnalysis/Issue records behind the
//! `analysis_core::Repository` port.

pub mod config;
pub mod error;
pub mod pool;
pub mod repository;
pub mod rows;

pub use config::StoreConfig;
pub use pool::connect;
pub use repository::{list_files_for_pr, list_issues_for_pr, PgRepository};
