//! Database connection management.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::secrets::DatabaseCredentials;
use crate::{Config, Error, Result};

/// Connection URL; values in the secret win over the environment.
pub fn database_url(config: &Config, creds: &DatabaseCredentials) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        creds.username,
        creds.password,
        creds.host.as_deref().unwrap_or(&config.db_host),
        creds.port.unwrap_or(5432),
        creds.dbname.as_deref().unwrap_or(&config.db_name),
    )
}

/// Create a database connection pool.
pub async fn create_pool(config: &Config, creds: &DatabaseCredentials) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url(config, creds))
        .await
        .map_err(Error::Database)
}
