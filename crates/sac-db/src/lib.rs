//! Relational store for the Student Activity Center platform
//!
//! Entities and migrations for accounts, student profiles, clubs, projects,
//! submission items, and the persisted email queue. SQLite is used for tests
//! and small deployments, PostgreSQL in production.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

pub mod entities;
pub mod migrator;

pub use migrator::Migrator;

/// Connect to the database.
///
/// Store calls fail closed rather than hang: connect/acquire timeouts are
/// bounded so an unreachable store surfaces as an error within seconds.
pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_string());
    options
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    Database::connect(options).await
}

/// Run all pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await
}
