use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::app::{self, MigrationError};
use crate::core::{self, DbError, ShopDomain, ShopDomainError};
use crate::db;
use crate::services::{orders, sync::SyncError};

#[rustfmt::skip]
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Migration creation failed")]
    MigrationCreateFailed { #[source] source: MigrationError },

    #[error("Checking migration status failed")]
    MigrationStatusCheckFailed { #[source] source: MigrationError },

    #[error("Running migrations failed")]
    MigrationRunFailed { #[source] source: MigrationError },

    #[error("Listing shops failed")]
    ShopListFailed { #[source] source: DbError },

    #[error("Invalid shop: {0}")]
    InvalidShop(#[from] ShopDomainError),

    #[error("Sync failed")]
    SyncFailed { #[source] source: SyncError },
}

#[derive(Debug, Parser)]
#[command(name = "shop-orders")]
#[command(about = "Shopify order dashboard backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Database migration utility
    Migrate {
        #[command(subcommand)]
        action: MigrateCommand,
    },
    /// List connected shops
    Shops,
    /// Fetch recent orders of a connected shop into the local cache
    Sync {
        /// Shop name or domain
        shop: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Create a new migration file
    Create {
        /// Name of the migration
        name: String,
    },
    /// List all embedded migrations
    List,
    /// Check if there are pending migrations
    Status,
    /// Run all pending migrations
    Run,
}

/// What the process should do once the command finished.
#[derive(Debug, PartialEq, Eq)]
pub enum CliOutcome {
    Serve,
    Exit,
}

pub async fn run_cli(context: &core::Context, command: Option<Command>) -> Result<CliOutcome, CliError> {
    let Some(command) = command else {
        return Ok(CliOutcome::Serve);
    };

    match command {
        Command::Serve => return Ok(CliOutcome::Serve),
        Command::Migrate { action } => run_migrate(context, action).await?,
        Command::Shops => {
            let shops = db::list_shops(&context.db)
                .await
                .map_err(|e| CliError::ShopListFailed { source: e })?;
            if shops.is_empty() {
                println!("No shops connected.");
            }
            for shop in shops {
                println!("{}\tconnected {}\tscope {}", shop.shop_domain, shop.updated_at, shop.scope.unwrap_or_default());
            }
        }
        Command::Sync { shop } => {
            let shop = ShopDomain::normalize(&shop)?;
            let outcome = orders::manual_sync(context, &shop)
                .await
                .map_err(|e| CliError::SyncFailed { source: e })?;
            println!("Synced {} orders for {} ({} failed)", outcome.count, shop, outcome.failed);
        }
    }

    Ok(CliOutcome::Exit)
}

async fn run_migrate(context: &core::Context, action: MigrateCommand) -> Result<(), CliError> {
    match action {
        MigrateCommand::Create { name } => {
            let filename = app::create_migration(&name).map_err(|e| CliError::MigrationCreateFailed { source: e })?;
            println!("Created new migration file: {filename}");
        }
        MigrateCommand::List => {
            let migrations = app::list_migrations();
            if migrations.is_empty() {
                println!("No migrations found.");
            } else {
                println!("Available migrations:");
                for (i, migration) in migrations.iter().enumerate() {
                    println!("{}. {}", i + 1, migration);
                }
            }
        }
        MigrateCommand::Status => match app::check_pending_migrations(&context.db).await {
            Ok(true) => println!("There are pending migrations that need to be applied."),
            Ok(false) => println!("Database is up to date. No pending migrations."),
            Err(MigrationError::NoMigrationsApplied) => println!("No migrations have been applied yet."),
            Err(e) => return Err(CliError::MigrationStatusCheckFailed { source: e }),
        },
        MigrateCommand::Run => {
            app::run_migrations(&context.db)
                .await
                .map_err(|e| CliError::MigrationRunFailed { source: e })?;
            println!("Migrations applied successfully.");
        }
    }
    Ok(())
}
