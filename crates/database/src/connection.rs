use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The pool is shared across the entire application; `DbRepository` clones are
/// cheap handles onto it.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&settings.url)
        .await?;

    info!(max_connections = settings.max_connections, "Database pool established");
    Ok(pool)
}

/// Applies the embedded migrations so the schema is up-to-date before serving.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
