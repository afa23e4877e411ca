//! Snapshot data model
//!
//! Types exchanged with the snapshot store. Widget configurations are
//! carried as opaque JSON and never inspected.

use crate::config::{DEFAULT_SNAPSHOT_TIME, DEFAULT_SNAPSHOT_TIMEZONE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Who triggered a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Auto,
    Manual,
}

impl SnapshotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Auto => "auto",
            SnapshotKind::Manual => "manual",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(SnapshotKind::Auto),
            "manual" => Ok(SnapshotKind::Manual),
            other => Err(format!("Unknown snapshot kind: {}", other)),
        }
    }
}

/// One captured widget and where it sat at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedCard {
    pub config: Value,
    pub card_index: usize,
    /// Absent on snapshots taken before section tracking existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_index_in_section: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
}

impl CapturedCard {
    /// Captured view reference for display: path, else id
    pub fn view_key(&self) -> Option<&str> {
        self.view_path.as_deref().or(self.view_id.as_deref())
    }

    /// Position inside the section, falling back to the plain index
    pub fn position_in_section(&self) -> usize {
        self.card_index_in_section.unwrap_or(self.card_index)
    }
}

/// Layout format of captured cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// No section information; positions are view-wide
    V1,
    /// Every card records its section
    V2,
}

impl SchemaVersion {
    /// Classify a group of cards; V2 only when every card carries a section
    pub fn of<'a>(cards: impl IntoIterator<Item = &'a CapturedCard>) -> Self {
        let mut any = false;
        for card in cards {
            if card.section_index.is_none() {
                return SchemaVersion::V1;
            }
            any = true;
        }
        if any {
            SchemaVersion::V2
        } else {
            SchemaVersion::V1
        }
    }
}

/// Capture payload before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub kind: SnapshotKind,
    pub created: DateTime<Utc>,
    pub cards: Vec<CapturedCard>,
    pub views_breakdown: BTreeMap<String, usize>,
    pub card_count: usize,
}

/// A persisted snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub kind: SnapshotKind,
    pub created: DateTime<Utc>,
    pub cards: Vec<CapturedCard>,
    #[serde(default)]
    pub views_breakdown: BTreeMap<String, usize>,
    #[serde(default)]
    pub card_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Snapshot {
    pub fn from_new(id: i64, new: NewSnapshot) -> Self {
        Self {
            id,
            kind: new.kind,
            created: new.created,
            cards: new.cards,
            views_breakdown: new.views_breakdown,
            card_count: new.card_count,
            label: None,
        }
    }
}

/// Listing entry; summaries only, no card payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotListItem {
    pub id: i64,
    pub kind: SnapshotKind,
    /// Calendar date of `created`, `YYYY-MM-DD`
    pub date: String,
    pub card_count: usize,
    pub views_breakdown: BTreeMap<String, usize>,
    pub size_kb: f64,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Daily auto snapshot schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSettings {
    pub enabled: bool,
    /// Local time of day, `HH:MM`
    pub time: String,
    /// IANA timezone name
    pub timezone: String,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            time: DEFAULT_SNAPSHOT_TIME.to_string(),
            timezone: DEFAULT_SNAPSHOT_TIMEZONE.to_string(),
        }
    }
}

/// Partial settings update; absent fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl SnapshotSettingsUpdate {
    pub fn apply_to(&self, settings: &mut SnapshotSettings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(time) = &self.time {
            settings.time = time.clone();
        }
        if let Some(timezone) = &self.timezone {
            settings.timezone = timezone.clone();
        }
    }
}
