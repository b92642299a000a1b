pub mod error;
pub mod movie;

use std::{str::FromStr as _, time::Duration};

pub use error::Error;
pub use sqlx::Error as SqlxError;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type ChosenRow = sqlx::sqlite::SqliteRow;
pub type Pool = sqlx::Pool<ChosenDB>;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_connections: 0,
            idle_timeout: Some(Duration::from_secs(15 * 60)),
        }
    }
}

pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    new_pool_with_config(database_url, &PoolConfig::default()).await
}

pub async fn new_pool_with_config(database_url: &str, config: &PoolConfig) -> Result<Pool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .idle_timeout(config.idle_timeout)
        .connect_with(options)
        .await?;
    debug!("Connected to database {database_url}");
    Ok(pool)
}

/// Applies embedded schema migrations, safe to call on every start.
pub async fn migrate(pool: &Pool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
