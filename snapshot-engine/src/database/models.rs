//! Database models
//!
//! Row structs for the snapshot store tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored snapshot row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SnapshotRow {
    pub id: i64,
    /// "auto" or "manual"
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub label: Option<String>,
    pub card_count: i64,
    /// JSON-encoded map of view title to card count
    pub views_breakdown: String,
    /// JSON-encoded list of captured cards
    pub payload: String,
    pub size_bytes: i64,
}

/// Summary row used for listings (no payload)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SnapshotSummaryRow {
    pub id: i64,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub label: Option<String>,
    pub card_count: i64,
    pub views_breakdown: String,
    pub size_bytes: i64,
}

/// Insert request for a snapshot row
#[derive(Debug)]
pub struct InsertSnapshotRequest<'a> {
    pub kind: &'a str,
    pub created_at: DateTime<Utc>,
    pub card_count: i64,
    pub views_breakdown: &'a str,
    pub payload: &'a str,
}
