//! Engine configuration
//!
//! Central location for configuration constants and the runtime
//! configuration loaded from the environment.

use crate::error::{AppError, Result};
use std::path::PathBuf;

// ===== Widget Tracking =====

/// Widget `type` discriminator the engine captures and restores
pub const DEFAULT_TRACKED_TYPE: &str = "custom:ultra-card";

/// Prefix of auto-generated widget names ("Ultra Card 1", "Ultra Card 2", ...)
pub const DEFAULT_NAME_PREFIX: &str = "Ultra Card";

/// Key inside a widget node holding its user-assigned name
pub const WIDGET_NAME_KEY: &str = "name";

/// Key inside a widget node holding its type discriminator
pub const WIDGET_TYPE_KEY: &str = "type";

// ===== Snapshot Store Limits =====

/// Auto snapshots older than this are pruned by the store
pub const AUTO_SNAPSHOT_RETENTION_DAYS: i64 = 30;

/// Default page size when listing snapshots
pub const DEFAULT_LIST_LIMIT: u32 = 30;

/// Upper bound for a single listing request
pub const MAX_LIST_LIMIT: u32 = 200;

/// Maximum length of a manual snapshot label
pub const MAX_LABEL_LENGTH: usize = 100;

// ===== Scheduler =====

/// Cron expression for the scheduler tick (every minute, at second 0)
pub const SCHEDULER_TICK_CRON: &str = "0 * * * * *";

/// Default time of day for the daily auto snapshot
pub const DEFAULT_SNAPSHOT_TIME: &str = "03:00";

/// Default timezone for the daily auto snapshot
pub const DEFAULT_SNAPSHOT_TIMEZONE: &str = "UTC";

/// Engine behaviour that hosts may override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub tracked_type: String,
    pub default_name_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracked_type: DEFAULT_TRACKED_TYPE.to_string(),
            default_name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

/// Where the snapshots live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Local SQLite database file
    Sqlite { db_path: PathBuf },
    /// Remote snapshot API
    Http { base_url: String, token: Option<String> },
}

/// Runtime configuration for the daemon
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub document_path: PathBuf,
    pub store: StoreConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load configuration from `SNAPSHOT_*` environment variables
    ///
    /// `SNAPSHOT_DOCUMENT` is required. `SNAPSHOT_API_URL` switches the store
    /// to the HTTP adapter; otherwise a SQLite database under
    /// `SNAPSHOT_DATA_DIR` (default `./data`) is used.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = lookup("SNAPSHOT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let document_path = lookup("SNAPSHOT_DOCUMENT")
            .map(PathBuf::from)
            .ok_or_else(|| AppError::Validation("SNAPSHOT_DOCUMENT is not set".to_string()))?;

        let store = match lookup("SNAPSHOT_API_URL") {
            Some(base_url) if !base_url.trim().is_empty() => StoreConfig::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                token: lookup("SNAPSHOT_API_TOKEN").filter(|t| !t.is_empty()),
            },
            _ => StoreConfig::Sqlite {
                db_path: data_dir.join("snapshots.sqlite"),
            },
        };

        let mut engine = EngineConfig::default();
        if let Some(tracked_type) = lookup("SNAPSHOT_TRACKED_TYPE") {
            engine.tracked_type = tracked_type;
        }
        if let Some(prefix) = lookup("SNAPSHOT_NAME_PREFIX") {
            engine.default_name_prefix = prefix;
        }

        Ok(Self {
            data_dir,
            document_path,
            store,
            engine,
        })
    }
}
