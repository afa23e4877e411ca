//! Settings service
//!
//! Reads and validates the auto-snapshot schedule kept by the snapshot store.

use crate::error::{AppError, Result};
use crate::snapshot::{SnapshotSettings, SnapshotSettingsUpdate};
use crate::store::SnapshotStore;
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::sync::Arc;

/// Parse a zero-padded 24h `HH:MM` time
pub fn parse_schedule_time(time: &str) -> Result<NaiveTime> {
    let parsed = NaiveTime::parse_from_str(time, "%H:%M")
        .ok()
        .filter(|t| t.format("%H:%M").to_string() == time)
        .ok_or_else(|| {
            AppError::Validation(format!("Invalid snapshot time '{}', expected HH:MM", time))
        })?;
    Ok(parsed)
}

/// Parse an IANA timezone name such as `Europe/Berlin`
pub fn parse_timezone(timezone: &str) -> Result<Tz> {
    timezone
        .parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Unknown timezone '{}'", timezone)))
}

/// Service for the auto-snapshot schedule
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SnapshotStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    pub async fn get_settings(&self) -> Result<SnapshotSettings> {
        self.store.get_settings().await
    }

    /// Validate and apply a partial update
    ///
    /// Omitted fields keep their stored values.
    pub async fn update_settings(&self, update: SnapshotSettingsUpdate) -> Result<SnapshotSettings> {
        if let Some(time) = &update.time {
            parse_schedule_time(time)?;
        }
        if let Some(timezone) = &update.timezone {
            parse_timezone(timezone)?;
        }

        let settings = self.store.update_settings(&update).await?;
        tracing::debug!("Snapshot schedule now {:?}", settings);
        Ok(settings)
    }
}
