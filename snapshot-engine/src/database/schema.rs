//! Database schema and migrations
//!
//! Schema changes are numbered SQL files. Each one is applied in its own
//! transaction and recorded in the `migrations` table, so reopening a
//! database only runs what it has not seen yet.

use crate::error::Result;
use sqlx::sqlite::SqlitePool;

/// Numbered migrations, oldest first
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("migrations/001_initial_schema.sql"))];

/// Bring the snapshot database up to the latest schema
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    // WAL keeps readers unblocked while the scheduler writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    let version = schema_version(pool).await?;
    let pending: Vec<_> = MIGRATIONS.iter().filter(|(v, _)| *v > version).collect();
    if pending.is_empty() {
        tracing::debug!("Snapshot schema up to date at version {}", version);
        return Ok(());
    }

    for (version, sql) in pending {
        apply_migration(pool, *version, sql).await?;
    }

    tracing::info!("Snapshot schema migrated to version {}", schema_version(pool).await?);
    Ok(())
}

async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM migrations")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

async fn apply_migration(pool: &SqlitePool, version: i64, sql: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    let statements = sql.split(';').map(str::trim).filter(|s| !s.is_empty());
    for statement in statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query("INSERT INTO migrations (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("Applied snapshot schema migration {}", version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_database() {
        let pool = memory_pool().await;

        initialize_database(&pool).await.unwrap();

        let applied: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(applied as usize, MIGRATIONS.len());

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('snapshots', 'settings') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["settings".to_string(), "snapshots".to_string()]);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let pool = memory_pool().await;

        initialize_database(&pool).await.unwrap();
        initialize_database(&pool).await.unwrap();

        let applied: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(applied as usize, MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_schema_version_tracks_latest_migration() {
        let pool = memory_pool().await;
        initialize_database(&pool).await.unwrap();

        let latest = MIGRATIONS.iter().map(|(v, _)| *v).max().unwrap();
        assert_eq!(schema_version(&pool).await.unwrap(), latest);
    }
}
