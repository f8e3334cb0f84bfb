//! Job store for the PrintSuit completion notifier.
//!
//! - [`JobStore`]: the narrow read/update/subscribe surface the notifier
//!   consumes.
//! - [`PgJobStore`]: PostgreSQL implementation; the change feed is driven by
//!   `LISTEN/NOTIFY` from a row trigger installed by the migrations.
//! - [`MemoryJobStore`]: in-process implementation used by tests and local
//!   tooling, with switches for simulating outages.

pub mod change;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub use change::{ChangeKind, JobChange};
pub use error::StoreError;
pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;
pub use store::{ChangeFeed, JobFilter, JobStore, MarkNotified};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Lightweight liveness probe: touch the `users` table.
///
/// An empty table still counts as healthy; only a failed round-trip does not.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1 FROM users LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
