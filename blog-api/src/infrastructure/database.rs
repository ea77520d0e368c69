use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

const MAX_CONNECTIONS: u32 = 20;
const MIN_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;
    info!(max_connections = MAX_CONNECTIONS, "postgres pool ready");
    Ok(pool)
}

/// Applies the embedded `migrations/` directory (categories, blogs and the cascading key).
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let migrator = sqlx::migrate!();
    info!(available = migrator.iter().count(), "applying schema migrations");
    migrator.run(pool).await
}
