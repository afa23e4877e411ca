//! Snapshot store
//!
//! The engine treats snapshot persistence as a request/response API and never
//! caches what it reads. Two adapters are provided: a local SQLite store and
//! an HTTP client for a remote snapshot service.

pub mod http;
pub mod sqlite;

pub use http::HttpSnapshotStore;
pub use sqlite::SqliteSnapshotStore;

use crate::error::{AppError, Result};
use crate::snapshot::{
    NewSnapshot, Snapshot, SnapshotListItem, SnapshotSettings, SnapshotSettingsUpdate,
};
use async_trait::async_trait;

/// Create/list/get/delete snapshots and read/update schedule settings
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a captured snapshot and return its id
    async fn create_snapshot(&self, snapshot: &NewSnapshot) -> Result<i64>;

    /// Summaries, newest first
    async fn list_snapshots(&self, limit: u32) -> Result<Vec<SnapshotListItem>>;

    async fn get_snapshot(&self, id: i64) -> Result<Snapshot>;

    /// Delete a manual snapshot; auto snapshots only age out
    async fn delete_snapshot(&self, id: i64) -> Result<()>;

    /// Label a manual snapshot
    async fn rename_snapshot(&self, id: i64, label: &str) -> Result<()>;

    async fn get_settings(&self) -> Result<SnapshotSettings>;

    /// Apply a partial update and return the resulting settings
    async fn update_settings(&self, update: &SnapshotSettingsUpdate) -> Result<SnapshotSettings>;
}

/// Fold backend failures (driver, transport, decode) into `Persistence`
///
/// Domain errors such as `SnapshotNotFound` and `Validation` pass through.
pub(crate) fn persistence(err: AppError) -> AppError {
    match err {
        AppError::Database(e) => AppError::Persistence(e.to_string()),
        AppError::Serialization(e) => AppError::Persistence(e.to_string()),
        AppError::Http(e) => AppError::Persistence(e.to_string()),
        AppError::Io(e) => AppError::Persistence(e.to_string()),
        other => other,
    }
}

/// Size in KiB rounded to one decimal, as shown in listings
pub(crate) fn size_kb(size_bytes: i64) -> f64 {
    (size_bytes.max(0) as f64 / 1024.0 * 10.0).round() / 10.0
}
