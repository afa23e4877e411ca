//! SQLite snapshot store
//!
//! Local implementation of [`SnapshotStore`] on top of the repository.
//! Auto snapshots older than the retention window are pruned whenever a new
//! auto snapshot is stored.

use super::{persistence, size_kb, SnapshotStore};
use crate::config::AUTO_SNAPSHOT_RETENTION_DAYS;
use crate::database::{InsertSnapshotRequest, Repository, SnapshotRow, SnapshotSummaryRow};
use crate::error::{AppError, Result};
use crate::snapshot::{
    NewSnapshot, Snapshot, SnapshotKind, SnapshotListItem, SnapshotSettings,
    SnapshotSettingsUpdate,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::BTreeMap;

const SETTINGS_KEY: &str = "snapshot_settings";

/// Snapshot store backed by the local database
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    repo: Repository,
}

impl SqliteSnapshotStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    async fn apply_retention_policy(&self) -> Result<()> {
        let cutoff = Utc::now() - Duration::days(AUTO_SNAPSHOT_RETENTION_DAYS);
        let pruned = self.repo.prune_auto_snapshots(cutoff).await?;
        if pruned > 0 {
            tracing::info!(
                "Pruned {} auto snapshots older than {} days",
                pruned,
                AUTO_SNAPSHOT_RETENTION_DAYS
            );
        }
        Ok(())
    }
}

fn parse_kind(kind: &str) -> Result<SnapshotKind> {
    kind.parse().map_err(AppError::Persistence)
}

fn parse_breakdown(raw: &str) -> Result<BTreeMap<String, usize>> {
    Ok(serde_json::from_str(raw)?)
}

fn row_to_snapshot(row: SnapshotRow) -> Result<Snapshot> {
    Ok(Snapshot {
        id: row.id,
        kind: parse_kind(&row.kind)?,
        created: row.created_at,
        cards: serde_json::from_str(&row.payload)?,
        views_breakdown: parse_breakdown(&row.views_breakdown)?,
        card_count: row.card_count.max(0) as usize,
        label: row.label,
    })
}

fn row_to_list_item(row: SnapshotSummaryRow) -> Result<SnapshotListItem> {
    Ok(SnapshotListItem {
        id: row.id,
        kind: parse_kind(&row.kind)?,
        date: row.created_at.format("%Y-%m-%d").to_string(),
        card_count: row.card_count.max(0) as usize,
        views_breakdown: parse_breakdown(&row.views_breakdown)?,
        size_kb: size_kb(row.size_bytes),
        created: row.created_at,
        label: row.label,
    })
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn create_snapshot(&self, snapshot: &NewSnapshot) -> Result<i64> {
        let payload = serde_json::to_string(&snapshot.cards)
            .map_err(AppError::from)
            .map_err(persistence)?;
        let views_breakdown = serde_json::to_string(&snapshot.views_breakdown)
            .map_err(AppError::from)
            .map_err(persistence)?;

        let id = self
            .repo
            .insert_snapshot(InsertSnapshotRequest {
                kind: snapshot.kind.as_str(),
                created_at: snapshot.created,
                card_count: snapshot.card_count as i64,
                views_breakdown: &views_breakdown,
                payload: &payload,
            })
            .await
            .map_err(persistence)?;

        tracing::info!(
            "Stored {} snapshot {} ({} cards, {} bytes)",
            snapshot.kind,
            id,
            snapshot.card_count,
            payload.len()
        );

        // The row is committed; a failed prune must not report the capture as failed
        if snapshot.kind == SnapshotKind::Auto {
            if let Err(e) = self.apply_retention_policy().await {
                tracing::warn!("Failed to prune old auto snapshots: {}", e);
            }
        }

        Ok(id)
    }

    async fn list_snapshots(&self, limit: u32) -> Result<Vec<SnapshotListItem>> {
        self.repo
            .list_snapshots(limit)
            .await
            .map_err(persistence)?
            .into_iter()
            .map(row_to_list_item)
            .collect::<Result<_>>()
            .map_err(persistence)
    }

    async fn get_snapshot(&self, id: i64) -> Result<Snapshot> {
        let row = self.repo.get_snapshot(id).await.map_err(persistence)?;
        row_to_snapshot(row).map_err(persistence)
    }

    async fn delete_snapshot(&self, id: i64) -> Result<()> {
        let row = self.repo.get_snapshot(id).await.map_err(persistence)?;
        if parse_kind(&row.kind)? != SnapshotKind::Manual {
            return Err(AppError::Validation(
                "Auto snapshots cannot be deleted; they expire automatically".to_string(),
            ));
        }

        self.repo.delete_snapshot(id).await.map_err(persistence)?;
        tracing::info!("Deleted manual snapshot {}", id);
        Ok(())
    }

    async fn rename_snapshot(&self, id: i64, label: &str) -> Result<()> {
        let row = self.repo.get_snapshot(id).await.map_err(persistence)?;
        if parse_kind(&row.kind)? != SnapshotKind::Manual {
            return Err(AppError::Validation(
                "Only manual snapshots can be renamed".to_string(),
            ));
        }

        self.repo.update_label(id, label).await.map_err(persistence)
    }

    async fn get_settings(&self) -> Result<SnapshotSettings> {
        match self.repo.get_setting(SETTINGS_KEY).await.map_err(persistence)? {
            Some(value) => serde_json::from_str(&value).map_err(|e| {
                AppError::Persistence(format!("Failed to parse snapshot settings: {}", e))
            }),
            None => Ok(SnapshotSettings::default()),
        }
    }

    async fn update_settings(&self, update: &SnapshotSettingsUpdate) -> Result<SnapshotSettings> {
        let mut settings = self.get_settings().await?;
        update.apply_to(&mut settings);

        let value = serde_json::to_string(&settings)
            .map_err(AppError::from)
            .map_err(persistence)?;
        self.repo
            .set_setting(SETTINGS_KEY, &value)
            .await
            .map_err(persistence)?;

        tracing::info!(
            "Snapshot settings updated: enabled={}, time={}, timezone={}",
            settings.enabled,
            settings.time,
            settings.timezone
        );
        Ok(settings)
    }
}
