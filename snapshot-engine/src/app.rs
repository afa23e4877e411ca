//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::{AppConfig, StoreConfig};
use crate::database::{create_pool, Repository};
use crate::document::{DocumentAccessor, JsonFileDocument};
use crate::engine::SnapshotEngine;
use crate::error::Result;
use crate::services::{AutoSnapshotTask, SchedulerService, SettingsService, SnapshotService};
use crate::store::{HttpSnapshotStore, SnapshotStore, SqliteSnapshotStore};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub snapshots: SnapshotService,
    pub settings: SettingsService,
    pub scheduler: Arc<SchedulerService>,
}

impl AppState {
    /// Wire services for `config`; the scheduler is created but not started
    pub async fn initialize(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing snapshot engine");
        tracing::info!("Data directory: {:?}", config.data_dir);
        tracing::info!("Dashboard document: {:?}", config.document_path);

        std::fs::create_dir_all(&config.data_dir)?;

        let store = open_store(&config.store).await?;
        let document: Arc<dyn DocumentAccessor> =
            Arc::new(JsonFileDocument::new(config.document_path.clone()));

        Self::with_parts(config, document, store).await
    }

    /// Wire services around an existing document accessor and store
    pub async fn with_parts(
        config: AppConfig,
        document: Arc<dyn DocumentAccessor>,
        store: Arc<dyn SnapshotStore>,
    ) -> Result<Self> {
        let engine = SnapshotEngine::new(&config.engine);
        tracing::info!("Tracking widgets of type {}", engine.tracked_type());

        let snapshots = SnapshotService::new(document, Arc::clone(&store), engine);
        let settings = SettingsService::new(store);
        let scheduler =
            SchedulerService::new(AutoSnapshotTask::new(snapshots.clone(), settings.clone()))
                .await?;

        tracing::info!("Application initialized successfully");

        Ok(Self {
            config,
            snapshots,
            settings,
            scheduler: Arc::new(scheduler),
        })
    }
}

async fn open_store(config: &StoreConfig) -> Result<Arc<dyn SnapshotStore>> {
    match config {
        StoreConfig::Sqlite { db_path } => {
            let pool = create_pool(db_path).await?;
            Ok(Arc::new(SqliteSnapshotStore::new(Repository::new(pool))))
        }
        StoreConfig::Http { base_url, token } => {
            tracing::info!("Using remote snapshot store at {}", base_url);
            Ok(Arc::new(HttpSnapshotStore::new(base_url.clone(), token.clone())))
        }
    }
}
