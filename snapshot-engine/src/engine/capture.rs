//! Capture assembler
//!
//! Turns a scan into a snapshot payload ready for the store.

use super::scanner::DashboardScanner;
use crate::document::DashboardDocument;
use crate::error::{AppError, Result};
use crate::snapshot::{NewSnapshot, SnapshotKind};
use chrono::Utc;
use std::collections::BTreeMap;

/// Packages scanner output into a [`NewSnapshot`]
#[derive(Debug, Clone)]
pub struct CaptureAssembler {
    scanner: DashboardScanner,
}

impl CaptureAssembler {
    pub fn new(scanner: DashboardScanner) -> Self {
        Self { scanner }
    }

    pub fn scanner(&self) -> &DashboardScanner {
        &self.scanner
    }

    /// Capture every tracked widget of `doc`
    ///
    /// Fails with [`AppError::EmptyCapture`] when the dashboard has none.
    pub fn capture(&self, doc: &DashboardDocument, kind: SnapshotKind) -> Result<NewSnapshot> {
        let scan = self.scanner.scan(doc);

        if scan.cards.is_empty() {
            tracing::info!(
                "No {} widgets found across {} views",
                self.scanner.tracked_type(),
                scan.views.len()
            );
            return Err(AppError::EmptyCapture);
        }

        let mut views_breakdown: BTreeMap<String, usize> = BTreeMap::new();
        for view in scan.views.iter().filter(|v| v.card_count > 0) {
            *views_breakdown.entry(view.label.clone()).or_default() += view.card_count;
        }

        let card_count = scan.cards.len();
        tracing::info!(
            "Captured {} widgets from {} views ({})",
            card_count,
            views_breakdown.len(),
            kind
        );

        Ok(NewSnapshot {
            kind,
            created: Utc::now(),
            cards: scan.cards,
            views_breakdown,
            card_count,
        })
    }
}
