use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::config;
use crate::database::schema;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection pool factory for the single durable store
pub struct DatabaseManager;

impl DatabaseManager {
    /// Default database location for local development
    const DEV_DATABASE_URL: &'static str = "sqlite:school.db?mode=rwc";

    /// Open the pool configured via DATABASE_URL and apply the schema
    pub async fn connect() -> Result<SqlitePool, DatabaseError> {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| Self::DEV_DATABASE_URL.to_string());
        Self::connect_with(&url).await
    }

    /// Open a pool against an explicit database URL
    pub async fn connect_with(url: &str) -> Result<SqlitePool, DatabaseError> {
        let db = config::config();

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(db.database.max_connections)
            .acquire_timeout(Duration::from_secs(db.database.connection_timeout))
            .connect_with(options)
            .await?;

        schema::migrate(&pool).await?;

        info!("Opened database pool for: {}", url);
        Ok(pool)
    }

    /// Fresh in-memory database, single connection so all queries share it
    pub async fn connect_in_memory() -> Result<SqlitePool, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        schema::migrate(&pool).await?;
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
