//! Snapshot service
//!
//! Coordinates the live dashboard, the snapshot engine and the store.
//! Every operation reads the document once, computes in memory and writes
//! at most once.

use crate::config::{DEFAULT_LIST_LIMIT, MAX_LABEL_LENGTH, MAX_LIST_LIMIT};
use crate::document::DocumentAccessor;
use crate::engine::{RestoreStats, RestoreStrategy, ScanResult, SnapshotEngine};
use crate::error::{AppError, Result};
use crate::snapshot::{Snapshot, SnapshotKind, SnapshotListItem};
use crate::store::SnapshotStore;
use std::sync::Arc;

/// Service for capturing, listing and restoring snapshots
#[derive(Clone)]
pub struct SnapshotService {
    document: Arc<dyn DocumentAccessor>,
    store: Arc<dyn SnapshotStore>,
    engine: SnapshotEngine,
}

impl SnapshotService {
    pub fn new(
        document: Arc<dyn DocumentAccessor>,
        store: Arc<dyn SnapshotStore>,
        engine: SnapshotEngine,
    ) -> Self {
        Self {
            document,
            store,
            engine,
        }
    }

    /// Scan the live dashboard without storing anything
    pub async fn inspect_dashboard(&self) -> Result<ScanResult> {
        let doc = self.document.read_document().await?;
        Ok(self.engine.assembler().scanner().scan(&doc))
    }

    /// User-triggered capture; errors reach the caller
    pub async fn create_manual_snapshot(&self) -> Result<i64> {
        self.capture(SnapshotKind::Manual).await
    }

    /// Scheduled capture
    ///
    /// Never fails: every error is logged and `None` is returned so the
    /// scheduler keeps ticking.
    pub async fn run_auto_snapshot(&self) -> Option<i64> {
        match self.capture(SnapshotKind::Auto).await {
            Ok(id) => Some(id),
            Err(AppError::EmptyCapture) => {
                tracing::info!("Scheduled snapshot skipped: no tracked widgets on the dashboard");
                None
            }
            Err(e) => {
                tracing::error!("Scheduled snapshot failed: {}", e);
                None
            }
        }
    }

    async fn capture(&self, kind: SnapshotKind) -> Result<i64> {
        tracing::info!("Creating {} snapshot", kind);

        let doc = self.document.read_document().await?;
        let new = self.engine.assembler().capture(&doc, kind)?;
        let id = self.store.create_snapshot(&new).await?;

        tracing::info!(
            "{} snapshot {} created with {} cards across {} views",
            kind,
            id,
            new.card_count,
            new.views_breakdown.len()
        );
        Ok(id)
    }

    /// List snapshot summaries, newest first
    ///
    /// `None` uses the default page size; larger values are clamped.
    pub async fn list_snapshots(&self, limit: Option<u32>) -> Result<Vec<SnapshotListItem>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        self.store.list_snapshots(limit).await
    }

    pub async fn get_snapshot(&self, id: i64) -> Result<Snapshot> {
        self.store.get_snapshot(id).await
    }

    pub async fn delete_snapshot(&self, id: i64) -> Result<()> {
        tracing::info!("Deleting snapshot: {}", id);
        self.store.delete_snapshot(id).await
    }

    /// Set the label of a manual snapshot
    pub async fn rename_snapshot(&self, id: i64, label: &str) -> Result<()> {
        let label = validate_label(label)?;
        self.store.rename_snapshot(id, label).await?;
        tracing::info!("Snapshot {} renamed to {:?}", id, label);
        Ok(())
    }

    /// Merge snapshot `id` into the live dashboard
    ///
    /// The snapshot is fetched before the document is read. If the write
    /// fails nothing is retried or rolled back; re-running the restore reads
    /// the document afresh.
    pub async fn restore_snapshot(&self, id: i64, strategy: RestoreStrategy) -> Result<RestoreStats> {
        tracing::info!("Restoring snapshot {} using {}", id, strategy);

        let snapshot = self.store.get_snapshot(id).await?;
        let doc = self.document.read_document().await?;

        let outcome = self.engine.restore(strategy, doc, &snapshot)?;

        self.document
            .write_document(&outcome.document)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Restore of snapshot {} computed but write-back failed: {}",
                    id,
                    e
                );
                e
            })?;

        let stats = outcome.stats;
        tracing::info!(
            "Snapshot {} restored: {} restored, {} deleted, {} skipped, {} unplaced, {} approximated",
            id,
            stats.restored,
            stats.deleted,
            stats.skipped,
            stats.unplaced,
            stats.approximated
        );
        Ok(stats)
    }
}

fn validate_label(label: &str) -> Result<&str> {
    let label = label.trim();
    if label.is_empty() {
        return Err(AppError::Validation(
            "Snapshot label cannot be empty".to_string(),
        ));
    }
    if label.chars().count() > MAX_LABEL_LENGTH {
        return Err(AppError::Validation(format!(
            "Snapshot label cannot exceed {} characters",
            MAX_LABEL_LENGTH
        )));
    }
    Ok(label)
}
