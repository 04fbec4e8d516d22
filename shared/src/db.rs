//! Database connection management.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

use crate::{Config, DatabaseCredentials, Error, Result};

/// Create a database connection pool.
///
/// A Lambda instance serves one request at a time, so the pool stays small.
pub async fn create_pool(config: &Config, credentials: &DatabaseCredentials) -> Result<PgPool> {
    let host = credentials.host.as_deref().unwrap_or(&config.db_host);
    let database = credentials.dbname.as_deref().unwrap_or(&config.db_name);

    let options = PgConnectOptions::new()
        .host(host)
        .port(credentials.port.unwrap_or(5432))
        .username(&credentials.username)
        .password(&credentials.password)
        .database(database);

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
        .map_err(Error::Database)?;

    Ok(pool)
}
