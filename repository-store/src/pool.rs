//! Pool bootstrap and schema migration.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::StoreConfig;

pub async fn connect(cfg: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("repository-store migrations applied");

    Ok(pool)
}
