//! Smart replace
//!
//! Non-destructive restore: rewrites tracked widgets in place when they can
//! be matched to a captured card by name or by position. Never adds or
//! removes widgets.

use super::binding::bucket_cards;
use super::naming::{DefaultNamer, NameKind};
use super::{RestoreOutcome, RestoreStats};
use crate::config::WIDGET_NAME_KEY;
use crate::document::{DashboardDocument, WidgetSlot};
use crate::error::{AppError, Result};
use crate::snapshot::{CapturedCard, Snapshot};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
struct ViewEntries<'a> {
    by_name: HashMap<String, &'a CapturedCard>,
    by_position: HashMap<usize, &'a CapturedCard>,
}

/// Name and position lookups built once from a snapshot, keyed by live view index
struct MatchIndex<'a> {
    views: HashMap<usize, ViewEntries<'a>>,
    unplaced: usize,
}

impl<'a> MatchIndex<'a> {
    fn build(doc: &DashboardDocument, snapshot: &'a Snapshot, namer: &DefaultNamer) -> Self {
        let buckets = bucket_cards(&doc.views, &snapshot.cards);

        let mut views = HashMap::new();
        for (view_index, mut cards) in buckets.by_view {
            // Ordinal is the capture-time position among tracked widgets of the view
            cards.sort_by_key(|c| (c.section_index.unwrap_or(0), c.position_in_section()));

            let mut entries = ViewEntries::default();
            for (ordinal, card) in cards.into_iter().enumerate() {
                let name = card
                    .card_name
                    .as_deref()
                    .or_else(|| card.config.get(WIDGET_NAME_KEY).and_then(Value::as_str));

                match namer.classify(name, ordinal) {
                    NameKind::Custom(name) => {
                        if entries.by_name.contains_key(&name) {
                            tracing::debug!(
                                "Duplicate widget name {:?} in view {}; keeping the first",
                                name,
                                doc.views[view_index].label()
                            );
                        } else {
                            entries.by_name.insert(name, card);
                        }
                    }
                    NameKind::Positional(ordinal) => {
                        entries.by_position.entry(ordinal).or_insert(card);
                    }
                }
            }
            views.insert(view_index, entries);
        }

        Self {
            views,
            unplaced: buckets.unplaced,
        }
    }

    fn find(&self, view_index: usize, kind: &NameKind) -> Option<&'a CapturedCard> {
        let entries = self.views.get(&view_index)?;
        match kind {
            NameKind::Custom(name) => entries.by_name.get(name).copied(),
            NameKind::Positional(ordinal) => entries.by_position.get(ordinal).copied(),
        }
    }
}

/// Rewrite matching widgets of `doc` with their captured configuration
///
/// Fails with [`AppError::NoMatchFound`] when nothing matched; in that case
/// the caller must not write anything back.
pub fn smart_replace(
    mut doc: DashboardDocument,
    snapshot: &Snapshot,
    tracked_type: &str,
    namer: &DefaultNamer,
) -> Result<RestoreOutcome> {
    let index = MatchIndex::build(&doc, snapshot, namer);
    let mut stats = RestoreStats {
        unplaced: index.unplaced,
        ..RestoreStats::default()
    };

    for (view_index, view) in doc.views.iter_mut().enumerate() {
        let label = view.label();
        let mut ordinal = 0;

        for slot in view.layout.slots_mut() {
            if !slot.is_type(tracked_type) {
                continue;
            }

            let kind = namer.classify(slot.name(), ordinal);
            ordinal += 1;

            match index.find(view_index, &kind) {
                Some(card) => {
                    *slot = WidgetSlot::new(card.config.clone());
                    stats.restored += 1;
                }
                None => {
                    tracing::debug!("No snapshot entry for {:?} in view {}", kind, label);
                    stats.skipped += 1;
                }
            }
        }
    }

    if stats.restored == 0 {
        tracing::warn!(
            "Smart replace matched no widgets ({} skipped); leaving dashboard untouched",
            stats.skipped
        );
        return Err(AppError::NoMatchFound);
    }

    tracing::info!(
        "Smart replace: {} restored, {} skipped, {} unplaced",
        stats.restored,
        stats.skipped,
        stats.unplaced
    );

    Ok(RestoreOutcome {
        document: doc,
        stats,
    })
}
