use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use sqlx::Error as SqlxError;
use sqlx::migrate::{MigrateError as SqlxMigrateError, Migrator};
use thiserror::Error;

use crate::core::DbContext;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[rustfmt::skip]
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to run embedded migrations")]
    EmbeddedMigrationFailed { source: SqlxMigrateError },

    #[error("No migrations applied yet")]
    NoMigrationsApplied,

    #[error("Failed to fetch applied migrations")]
    FetchAppliedMigrationsFailed { #[from] source: SqlxError },

    #[error("File system error")]
    FileSystemOperationFailed { #[from] source: std::io::Error },
}

/// Descriptions of the embedded migrations, oldest first.
#[must_use]
pub fn list_migrations() -> Vec<String> {
    MIGRATOR.iter().map(|m| format!("{} {}", m.version, m.description)).collect()
}

pub async fn run_migrations(db: &DbContext) -> Result<(), MigrationError> {
    MIGRATOR
        .run(db)
        .await
        .map_err(|e| MigrationError::EmbeddedMigrationFailed { source: e })?;
    tracing::info!("Database migrations completed successfully.");
    Ok(())
}

/// `true` when embedded migrations exist that the database has not applied.
pub async fn check_pending_migrations(db: &DbContext) -> Result<bool, MigrationError> {
    let applied = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(db)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(e) if e.message().contains("no such table") => MigrationError::NoMigrationsApplied,
            _ => MigrationError::FetchAppliedMigrationsFailed { source: err },
        })?;
    let available = MIGRATOR.iter().filter(|m| m.migration_type.is_up_migration()).count();
    Ok(i64::try_from(available).unwrap_or(i64::MAX) > applied)
}

fn migrations_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

/// Creates an empty migration file named with the current timestamp as its version.
pub fn create_migration(name: &str) -> Result<String, MigrationError> {
    let migrations_path = migrations_dir();
    if !migrations_path.exists() {
        std::fs::create_dir_all(&migrations_path)?;
    }

    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();
    let normalized_name = name.trim().replace(' ', "_").to_lowercase();
    let filename = format!("{timestamp}_{normalized_name}.sql");
    let filepath = migrations_path.join(&filename);

    let mut file = File::create(&filepath)?;
    writeln!(file, "-- Migration: {name}")?;
    writeln!(file, "--")?;
    writeln!(file, "-- Add migration script here")?;

    tracing::info!("Created new migration file: {}.", filepath.display());
    Ok(filename)
}
