use std::env;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use analysis_core::{run_task_with_retries, WorkerDeps};
use code_host::GitHubClient;
use embeddings_engine::EmbeddingEngine;
use llm_client::LlmClient;
use repository_store::{PgRepository, StoreConfig};
use task_queue::{QueueConfig, RedisQueue};

fn init_logging() {
    let format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Claims tickets from the queue and drives each one through the worker
/// until the process is killed. Runs alongside the submission API.
async fn run_worker_loop(deps: Arc<WorkerDeps<PgRepository, RedisQueue>>, queue: Arc<RedisQueue>) {
    loop {
        match queue.claim().await {
            Ok(Some(ticket)) => {
                info!(task_id = %ticket.task_id, ticket_id = %ticket.ticket_id, "claimed task");
                run_task_with_retries(&deps, &ticket.task_id, &ticket.ticket_id).await;
            }
            Ok(None) => {
                if let Err(e) = queue.recover_expired().await {
                    warn!(error = %e, "failed to sweep expired tickets");
                }
            }
            Err(e) => {
                error!(error = %e, "failed to claim from queue, backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Best-effort: absence of a .env file is not fatal, real deployments
    // inject configuration via the environment directly.
    let _ = dotenvy::dotenv();
    init_logging();

    let store_cfg = StoreConfig::from_env();
    let pool = repository_store::connect(&store_cfg).await?;
    let repo = Arc::new(PgRepository::new(pool));

    let queue_cfg = QueueConfig::from_env();
    let queue = Arc::new(RedisQueue::connect(queue_cfg)?);

    let code_host_base = env::var("CODE_HOST_API_URL").unwrap_or_else(|_| "https://api.github.com".to_string());
    let code_host_token = env::var("CODE_HOST_TOKEN").unwrap_or_default();
    let code_host = Arc::new(GitHubClient::new(code_host_base, code_host_token)?);

    let llm = Arc::new(LlmClient::new(llm_client::LlmConfig::from_env()?)?);
    let embeddings = Arc::new(EmbeddingEngine::new(embeddings_engine::EmbeddingConfig::from_env()?));

    let deps = Arc::new(WorkerDeps {
        repo,
        queue: queue.clone(),
        code_host,
        llm,
        embeddings,
    });

    info!("pr-review-worker starting: submission API + claim loop");

    tokio::select! {
        result = api::start() => {
            if let Err(e) = result {
                error!(error = %e, "submission API exited");
            }
        }
        _ = run_worker_loop(deps, queue) => {}
    }

    Ok(())
}
