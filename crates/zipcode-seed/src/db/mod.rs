//! Database integration for seeding tables.
//!
//! The [`Seeder`] empties a table and bulk-inserts prepared CSV rows into it.
//! Connections go through [`sqlx::AnyPool`] so the same code runs against
//! PostgreSQL and SQLite.

mod seeder;

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

pub use seeder::{SeedError, SeedResult, Seeder};

/// Opens a single-connection pool for the given database URL.
///
/// Seeding is one linear sequence, and a single connection keeps an
/// in-memory SQLite database alive for the lifetime of the pool.
pub async fn connect(url: &str) -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();

    AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(url)
        .await
}
