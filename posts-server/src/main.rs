use posts_server::infrastructure::config::AppConfig;
use posts_server::infrastructure::database::{create_pool, run_migrations};
use posts_server::infrastructure::logging::init_logging;
use posts_server::server::{self, AppServices};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.max_connections).await?;
    run_migrations(&pool).await?;

    let services = AppServices::postgres(pool, &config);
    server::run(&config, services).await
}
