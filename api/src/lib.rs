pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use std::env;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tracing::info;

use core::app_state::AppState;
use middleware_layer::json_extractor::json_error_mapper;
use repository_store::{PgRepository, StoreConfig};
use task_queue::{QueueConfig, RedisQueue};

/// Builds the submission-surface router and binds it to `API_BIND_ADDR`
/// (default `0.0.0.0:8080`). Runs until the process is terminated.
pub async fn start() -> Result<(), Box<dyn std::error::Error>> {
    let store_cfg = StoreConfig::from_env();
    let pool = repository_store::connect(&store_cfg).await?;
    let repo = Arc::new(PgRepository::new(pool.clone()));

    let queue_cfg = QueueConfig::from_env();
    let queue = Arc::new(RedisQueue::connect(queue_cfg)?);

    let state = Arc::new(AppState { repo, pool, queue });

    let app = Router::new()
        .route("/analysis", post(routes::analysis::submit_analysis_route))
        .route("/analysis/{task_id}/status", get(routes::analysis::get_status_route))
        .route("/analysis/{task_id}/results", get(routes::analysis::get_results_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state);

    let bind_addr = env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "submission API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
