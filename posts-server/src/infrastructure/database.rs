use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!();

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    info!(max_connections, "database pool ready");
    Ok(pool)
}

/// Brings the schema up to date. Already applied migrations are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    info!(known = MIGRATOR.iter().count(), "schema is up to date");
    Ok(())
}
