//! Snapshot engine
//!
//! Scanning, capture assembly and the two restore strategies. Everything in
//! here is synchronous and works on in-memory documents; reading and writing
//! the live dashboard is left to the services layer.

pub mod binding;
pub mod capture;
pub mod clean_restore;
pub mod naming;
pub mod scanner;
pub mod smart_replace;

pub use capture::CaptureAssembler;
pub use naming::{DefaultNamer, NameKind};
pub use scanner::{DashboardScanner, ScanResult, ViewMeta};

use crate::config::EngineConfig;
use crate::document::DashboardDocument;
use crate::error::Result;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Counters reported by a restore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreStats {
    /// Widgets written from the snapshot
    pub restored: usize,
    /// Widgets removed before rebuilding (clean restore only)
    pub deleted: usize,
    /// Live widgets left untouched for lack of a match (smart replace only)
    pub skipped: usize,
    /// Captured widgets whose view could not be resolved
    pub unplaced: usize,
    /// Widgets placed by even distribution because the snapshot had no section data
    pub approximated: usize,
}

/// Rebuilt document plus counters
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreOutcome {
    pub document: DashboardDocument,
    pub stats: RestoreStats,
}

/// How a snapshot is merged back into the live dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreStrategy {
    /// Rewrite matching widgets in place
    SmartReplace,
    /// Delete all tracked widgets and rebuild from the snapshot
    CleanRestore,
}

impl fmt::Display for RestoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreStrategy::SmartReplace => f.write_str("smart_replace"),
            RestoreStrategy::CleanRestore => f.write_str("clean_restore"),
        }
    }
}

impl FromStr for RestoreStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "smart_replace" | "smart" => Ok(RestoreStrategy::SmartReplace),
            "clean_restore" | "clean" => Ok(RestoreStrategy::CleanRestore),
            other => Err(format!("Unknown restore strategy: {}", other)),
        }
    }
}

/// Entry point bundling scanner, assembler and both restore strategies
#[derive(Debug, Clone)]
pub struct SnapshotEngine {
    assembler: CaptureAssembler,
    namer: DefaultNamer,
    tracked_type: String,
}

impl SnapshotEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let namer = DefaultNamer::new(config.default_name_prefix.clone());
        let scanner = DashboardScanner::new(config.tracked_type.clone(), namer.clone());
        Self {
            assembler: CaptureAssembler::new(scanner),
            namer,
            tracked_type: config.tracked_type.clone(),
        }
    }

    pub fn assembler(&self) -> &CaptureAssembler {
        &self.assembler
    }

    pub fn tracked_type(&self) -> &str {
        &self.tracked_type
    }

    /// Merge `snapshot` into `doc` using `strategy`
    pub fn restore(
        &self,
        strategy: RestoreStrategy,
        doc: DashboardDocument,
        snapshot: &Snapshot,
    ) -> Result<RestoreOutcome> {
        match strategy {
            RestoreStrategy::SmartReplace => {
                smart_replace::smart_replace(doc, snapshot, &self.tracked_type, &self.namer)
            }
            RestoreStrategy::CleanRestore => Ok(clean_restore::clean_restore(
                doc,
                snapshot,
                &self.tracked_type,
            )),
        }
    }
}

impl Default for SnapshotEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
