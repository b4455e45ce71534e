use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

use crate::cfg;

pub type DbContext = sqlx::SqlitePool;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    ConnectionFailed(sqlx::Error),

    #[error("Database operation failed: {0}")]
    OperationFailed(sqlx::Error),

    #[error("Row not found: {0}")]
    RowNotFound(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::RowNotFound(error),
            _ => Self::OperationFailed(error),
        }
    }
}

pub async fn create_db_context(db_settings: &cfg::DatabaseSettings) -> Result<DbContext, DbError> {
    let options = SqliteConnectOptions::from_str(&db_settings.url)
        .map_err(DbError::ConnectionFailed)?
        .create_if_missing(true)
        .foreign_keys(true)
        // Increase SQLite busy timeout to handle concurrent connections better
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(db_settings.max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(DbError::ConnectionFailed)?;

    tracing::info!(url = %db_settings.url, "Database pool initialized");
    Ok(pool)
}
