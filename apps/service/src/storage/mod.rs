/// Status storage
///
/// Persists every check outcome to a local libsql database so operators can
/// inspect history beyond the engine's in-memory windows.

pub mod migrations;
pub mod models;
pub mod repository;

pub use models::WebsiteStatus;
pub use repository::LibsqlStatusSink;

use anyhow::Result;

use crate::pool::{LibsqlManager, LibsqlPool};

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}

/// Open (or create) the database at `db_path` and run migrations
pub async fn open_pool(db_path: &str) -> Result<LibsqlPool> {
    let database = libsql::Builder::new_local(db_path).build().await?;
    let pool = LibsqlPool::builder(LibsqlManager::new(database)).build()?;

    let conn = pool.get().await?;
    initialize_database(&conn).await?;

    Ok(pool)
}
