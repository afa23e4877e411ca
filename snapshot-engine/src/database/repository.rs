//! Repository layer for database operations
//!
//! CRUD operations for stored snapshots and settings.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a snapshot, returning its id
    pub async fn insert_snapshot(&self, req: InsertSnapshotRequest<'_>) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO snapshots (kind, created_at, card_count, views_breakdown, payload, size_bytes)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(req.kind)
        .bind(req.created_at)
        .bind(req.card_count)
        .bind(req.views_breakdown)
        .bind(req.payload)
        .bind(req.payload.len() as i64)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Inserted {} snapshot: {}", req.kind, id);
        Ok(id)
    }

    /// Get a snapshot by ID
    pub async fn get_snapshot(&self, id: i64) -> Result<SnapshotRow> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT * FROM snapshots WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::SnapshotNotFound(id))?;

        Ok(row)
    }

    /// List snapshot summaries, newest first
    pub async fn list_snapshots(&self, limit: u32) -> Result<Vec<SnapshotSummaryRow>> {
        let rows = sqlx::query_as::<_, SnapshotSummaryRow>(
            r#"
            SELECT id, kind, created_at, label, card_count, views_breakdown, size_bytes
            FROM snapshots
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete a snapshot
    pub async fn delete_snapshot(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM snapshots WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::SnapshotNotFound(id));
        }

        tracing::debug!("Deleted snapshot: {}", id);
        Ok(())
    }

    /// Set the label of a snapshot
    pub async fn update_label(&self, id: i64, label: &str) -> Result<()> {
        let result = sqlx::query("UPDATE snapshots SET label = ? WHERE id = ?")
            .bind(label)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::SnapshotNotFound(id));
        }

        tracing::debug!("Renamed snapshot {} to {:?}", id, label);
        Ok(())
    }

    /// Delete auto snapshots created before `cutoff`, returning how many went
    pub async fn prune_auto_snapshots(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM snapshots WHERE kind = 'auto' AND created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Get/set settings
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Set setting: {} = {}", key, value);
        Ok(())
    }
}
