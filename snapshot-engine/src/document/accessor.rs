//! Live document access
//!
//! The engine reads the whole dashboard once and writes it back at most once
//! per operation. There is no partial-patch protocol: every write replaces
//! the whole document.

use super::model::DashboardDocument;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Read/write access to the live dashboard document
#[async_trait]
pub trait DocumentAccessor: Send + Sync {
    async fn read_document(&self) -> Result<DashboardDocument>;

    async fn write_document(&self, doc: &DashboardDocument) -> Result<()>;
}

/// Dashboard stored as a JSON file on disk
#[derive(Clone)]
pub struct JsonFileDocument {
    path: PathBuf,
}

impl JsonFileDocument {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentAccessor for JsonFileDocument {
    async fn read_document(&self) -> Result<DashboardDocument> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::DocumentAccess(format!("Failed to read {:?}: {}", self.path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            AppError::DocumentAccess(format!("Invalid dashboard document {:?}: {}", self.path, e))
        })
    }

    async fn write_document(&self, doc: &DashboardDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)?;

        // Write next to the target, then rename over it so readers never see
        // a half-written dashboard
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "dashboard".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = fs::write(&temp_path, content).await {
            return Err(AppError::DocumentAccess(format!(
                "Failed to write {:?}: {}",
                temp_path, e
            )));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::DocumentAccess(format!(
                "Failed to replace {:?}: {}",
                self.path, e
            )));
        }

        tracing::debug!("Dashboard written to {:?}", self.path);
        Ok(())
    }
}

/// In-process dashboard, used by embedders and tests
#[derive(Clone, Default)]
pub struct MemoryDocument {
    doc: Arc<RwLock<DashboardDocument>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryDocument {
    pub fn new(doc: DashboardDocument) -> Self {
        Self {
            doc: Arc::new(RwLock::new(doc)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current document contents
    pub async fn snapshot(&self) -> DashboardDocument {
        self.doc.read().await.clone()
    }

    /// Number of completed writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentAccessor for MemoryDocument {
    async fn read_document(&self) -> Result<DashboardDocument> {
        Ok(self.doc.read().await.clone())
    }

    async fn write_document(&self, doc: &DashboardDocument) -> Result<()> {
        *self.doc.write().await = doc.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
