//! Database module
//!
//! Local SQLite backing for the snapshot store:
//! - Schema and migrations
//! - Row models
//! - Repository layer for CRUD operations

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::initialize_database;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

fn connect_options(db_path: &Path) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    Ok(SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true))
}

/// Open the snapshot database at `db_path`, creating and migrating it as needed
///
/// The schema is brought up to date over a single connection which is closed
/// again before the shared pool is handed out.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening snapshot database at: {:?}", db_path);

    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let setup = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(db_path)?)
        .await?;
    let migrated = initialize_database(&setup).await;
    setup.close().await;
    migrated?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options(db_path)?)
        .await?;

    tracing::info!("Snapshot database ready");
    Ok(pool)
}
