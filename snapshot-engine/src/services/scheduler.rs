/// Scheduler Service
/// Runs the daily auto snapshot from a once-per-minute cron tick
/// Each tick re-reads the schedule so settings changes apply without a restart
use crate::config::SCHEDULER_TICK_CRON;
use crate::error::{AppError, Result};
use crate::services::settings::{parse_schedule_time, parse_timezone};
use crate::services::{SettingsService, SnapshotService};
use crate::snapshot::SnapshotSettings;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// Whether the auto snapshot should run at `now`
///
/// Due when the schedule is enabled, the local time in the configured
/// timezone has reached `HH:MM`, and no run has happened yet on today's
/// local date.
pub fn is_due(
    now: DateTime<Utc>,
    settings: &SnapshotSettings,
    last_run: Option<NaiveDate>,
) -> Result<bool> {
    if !settings.enabled {
        return Ok(false);
    }

    let at = parse_schedule_time(&settings.time)?;
    let tz = parse_timezone(&settings.timezone)?;
    let local = now.with_timezone(&tz);

    if local.time() < at {
        return Ok(false);
    }

    Ok(last_run != Some(local.date_naive()))
}

/// Clears the in-flight flag when a tick finishes
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One auto-snapshot decision per tick, never more than one at a time
pub struct AutoSnapshotTask {
    snapshots: SnapshotService,
    settings: SettingsService,
    running: AtomicBool,
    last_run: RwLock<Option<NaiveDate>>,
}

impl AutoSnapshotTask {
    pub fn new(snapshots: SnapshotService, settings: SettingsService) -> Self {
        Self {
            snapshots,
            settings,
            running: AtomicBool::new(false),
            last_run: RwLock::new(None),
        }
    }

    /// Local date of the last successful auto snapshot
    pub async fn last_run(&self) -> Option<NaiveDate> {
        *self.last_run.read().await
    }

    /// Evaluate the schedule now
    pub async fn tick(&self) -> Option<i64> {
        self.tick_at(Utc::now()).await
    }

    /// Evaluate the schedule as of `now`
    ///
    /// A tick that starts while another is still running does nothing.
    /// Errors are logged and never returned.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Option<i64> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("Auto snapshot still in progress, skipping tick");
            return None;
        }
        let _guard = InFlight(&self.running);

        let settings = match self.settings.get_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Failed to load snapshot schedule: {}", e);
                return None;
            }
        };

        let last_run = *self.last_run.read().await;
        match is_due(now, &settings, last_run) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::error!("Invalid snapshot schedule: {}", e);
                return None;
            }
        }

        tracing::info!("Running scheduled auto snapshot");
        let id = self.snapshots.run_auto_snapshot().await?;

        // is_due already validated the timezone
        if let Ok(tz) = parse_timezone(&settings.timezone) {
            *self.last_run.write().await = Some(now.with_timezone(&tz).date_naive());
        }
        Some(id)
    }
}

/// Scheduler service for automatic snapshots
pub struct SchedulerService {
    scheduler: Arc<RwLock<JobScheduler>>,
    task: Arc<AutoSnapshotTask>,
    current_job_id: Arc<RwLock<Option<Uuid>>>,
}

impl SchedulerService {
    /// Create new scheduler service
    pub async fn new(task: AutoSnapshotTask) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            task: Arc::new(task),
            current_job_id: Arc::new(RwLock::new(None)),
        })
    }

    pub fn task(&self) -> &Arc<AutoSnapshotTask> {
        &self.task
    }

    /// Register the minute tick and start the scheduler
    pub async fn start(&self) -> Result<()> {
        let task = Arc::clone(&self.task);

        let job = Job::new_async(SCHEDULER_TICK_CRON, move |_uuid, _l| {
            let task = Arc::clone(&task);
            Box::pin(async move {
                if let Some(id) = task.tick().await {
                    tracing::info!("Scheduled auto snapshot created: {}", id);
                }
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Failed to create snapshot job: {}", e)))?;

        let job_id = job.guid();

        {
            let scheduler = self.scheduler.write().await;
            scheduler
                .add(job)
                .await
                .map_err(|e| AppError::Scheduler(format!("Failed to schedule job: {}", e)))?;
            scheduler
                .start()
                .await
                .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {}", e)))?;
        }

        *self.current_job_id.write().await = Some(job_id);

        tracing::info!("Snapshot scheduler started ({})", SCHEDULER_TICK_CRON);
        Ok(())
    }

    /// Remove the tick job, leaving the scheduler running
    pub async fn stop(&self) -> Result<()> {
        let mut current_job = self.current_job_id.write().await;

        if let Some(job_id) = *current_job {
            let scheduler = self.scheduler.write().await;
            scheduler
                .remove(&job_id)
                .await
                .map_err(|e| AppError::Scheduler(format!("Failed to remove job: {}", e)))?;

            *current_job = None;
            tracing::info!("Snapshot schedule cancelled");
        }

        Ok(())
    }

    /// Shutdown scheduler gracefully
    pub async fn shutdown(&self) -> Result<()> {
        self.stop().await?;

        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {}", e)))?;
        tracing::info!("Snapshot scheduler shutdown");
        Ok(())
    }
}
