//! Dashboard scanner
//!
//! Walks the live document and records every tracked widget together with
//! the position it occupies. Pure read.

use super::naming::DefaultNamer;
use crate::document::{DashboardDocument, View, ViewKind, ViewLayout, WidgetSlot};
use crate::snapshot::CapturedCard;

/// Per-view summary produced alongside the captures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMeta {
    pub id: Option<String>,
    pub path: Option<String>,
    pub title: Option<String>,
    pub label: String,
    pub kind: ViewKind,
    pub card_count: usize,
}

/// Result of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub cards: Vec<CapturedCard>,
    pub views: Vec<ViewMeta>,
}

/// Finds tracked widgets in a dashboard document
#[derive(Debug, Clone)]
pub struct DashboardScanner {
    tracked_type: String,
    namer: DefaultNamer,
}

impl DashboardScanner {
    pub fn new(tracked_type: impl Into<String>, namer: DefaultNamer) -> Self {
        Self {
            tracked_type: tracked_type.into(),
            namer,
        }
    }

    pub fn tracked_type(&self) -> &str {
        &self.tracked_type
    }

    /// Capture every tracked widget in document order
    pub fn scan(&self, doc: &DashboardDocument) -> ScanResult {
        let mut result = ScanResult::default();

        for view in &doc.views {
            let before = result.cards.len();
            self.scan_view(view, &mut result.cards);
            let card_count = result.cards.len() - before;

            tracing::debug!(
                "Scanned view {:?}: {} tracked widgets",
                view.label(),
                card_count
            );

            result.views.push(ViewMeta {
                id: view.id.clone(),
                path: view.path.clone(),
                title: view.title.clone(),
                label: view.label(),
                kind: view.kind(),
                card_count,
            });
        }

        result
    }

    fn scan_view(&self, view: &View, out: &mut Vec<CapturedCard>) {
        let mut ordinal = 0;

        match &view.layout {
            ViewLayout::Flat { cards } => {
                for (card_index, slot) in cards.iter().enumerate() {
                    if slot.is_type(&self.tracked_type) {
                        out.push(self.capture(view, slot, ordinal, card_index, None));
                        ordinal += 1;
                    }
                }
            }
            ViewLayout::Sectioned { sections } => {
                for (section_index, section) in sections.iter().enumerate() {
                    for (card_index, slot) in section.cards.iter().enumerate() {
                        if slot.is_type(&self.tracked_type) {
                            out.push(self.capture(
                                view,
                                slot,
                                ordinal,
                                card_index,
                                Some(section_index),
                            ));
                            ordinal += 1;
                        }
                    }
                }
            }
        }
    }

    fn capture(
        &self,
        view: &View,
        slot: &WidgetSlot,
        ordinal: usize,
        card_index: usize,
        section_index: Option<usize>,
    ) -> CapturedCard {
        let card_name = slot
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| self.namer.default_name(ordinal));

        CapturedCard {
            config: slot.config().clone(),
            card_index,
            section_index,
            card_index_in_section: section_index.map(|_| card_index),
            view_path: view.path.clone(),
            view_id: view.id.clone(),
            card_name: Some(card_name),
        }
    }
}
