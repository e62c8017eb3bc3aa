//! PostgreSQL persistence for the Guardbook ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations, including the append-only audit trigger
//! - `PgLedgerStore`, the production implementation of the core store traits

mod convert;
pub mod entities;
pub mod migration;
pub mod store;

pub use store::{PgLedgerStore, PgUnitOfWork};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use guardbook_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized by `config`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
