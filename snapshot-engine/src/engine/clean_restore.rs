//! Clean restore
//!
//! Destructive rebuild: every tracked widget is removed from the live
//! document, then the snapshot's cards are reinserted view by view.

use super::binding::bucket_cards;
use super::{RestoreOutcome, RestoreStats};
use crate::document::{DashboardDocument, Section, View, ViewLayout, WidgetSlot};
use crate::snapshot::{CapturedCard, SchemaVersion, Snapshot};
use std::collections::BTreeMap;

/// Wipe all `tracked_type` widgets from `doc` and rebuild them from `snapshot`
pub fn clean_restore(
    mut doc: DashboardDocument,
    snapshot: &Snapshot,
    tracked_type: &str,
) -> RestoreOutcome {
    let mut stats = RestoreStats::default();

    for view in &mut doc.views {
        stats.deleted += view.layout.remove_widgets(tracked_type);
    }
    tracing::debug!("Clean restore removed {} widgets", stats.deleted);

    let buckets = bucket_cards(&doc.views, &snapshot.cards);
    stats.unplaced = buckets.unplaced;

    for (index, cards) in buckets.by_view {
        insert_cards(&mut doc.views[index], cards, &mut stats);
    }

    tracing::info!(
        "Clean restore: {} deleted, {} restored ({} approximated), {} unplaced",
        stats.deleted,
        stats.restored,
        stats.approximated,
        stats.unplaced
    );

    RestoreOutcome {
        document: doc,
        stats,
    }
}

fn insert_cards(view: &mut View, mut cards: Vec<&CapturedCard>, stats: &mut RestoreStats) {
    let label = view.label();
    let version = SchemaVersion::of(cards.iter().copied());

    match (&mut view.layout, version) {
        (ViewLayout::Sectioned { sections }, SchemaVersion::V2) => {
            let mut by_section: BTreeMap<usize, Vec<&CapturedCard>> = BTreeMap::new();
            for card in cards {
                by_section
                    .entry(card.section_index.unwrap_or(0))
                    .or_default()
                    .push(card);
            }

            if let Some(&max_index) = by_section.keys().next_back() {
                while sections.len() <= max_index {
                    sections.push(Section::default());
                }
            }

            for (section_index, mut group) in by_section {
                group.sort_by_key(|c| c.position_in_section());
                let section = &mut sections[section_index];
                for card in group {
                    section.cards.push(WidgetSlot::new(card.config.clone()));
                    stats.restored += 1;
                }
            }
        }
        (ViewLayout::Sectioned { sections }, SchemaVersion::V1) => {
            if sections.is_empty() {
                sections.push(Section::default());
            }
            cards.sort_by_key(|c| c.card_index);

            let assignments = legacy_assignments(cards.len(), sections.len());
            tracing::warn!(
                "Legacy snapshot without section data for view {:?}: distributing {} widgets evenly across {} sections",
                label,
                cards.len(),
                sections.len()
            );

            for (card, section_index) in cards.into_iter().zip(assignments) {
                sections[section_index]
                    .cards
                    .push(WidgetSlot::new(card.config.clone()));
                stats.restored += 1;
                stats.approximated += 1;
            }
        }
        (ViewLayout::Flat { cards: slots }, _) => {
            cards.sort_by_key(|c| (c.section_index.unwrap_or(0), c.position_in_section()));
            for card in cards {
                slots.push(WidgetSlot::new(card.config.clone()));
                stats.restored += 1;
            }
        }
    }
}

/// Section index for each of `total` cards spread over `section_count` sections
///
/// Uses ceiling division so earlier sections fill first:
/// card `i` lands in section `i / ceil(total / section_count)`.
pub fn legacy_assignments(total: usize, section_count: usize) -> Vec<usize> {
    if total == 0 || section_count == 0 {
        return Vec::new();
    }
    let per_section = total.div_ceil(section_count);
    (0..total).map(|i| i / per_section).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::capture::CaptureAssembler;
    use crate::engine::naming::DefaultNamer;
    use crate::engine::scanner::DashboardScanner;
    use crate::snapshot::SnapshotKind;
    use serde_json::json;

    const TRACKED: &str = "custom:ultra-card";

    fn widget(n: u32) -> WidgetSlot {
        WidgetSlot::new(json!({"type": TRACKED, "n": n}))
    }

    fn other() -> WidgetSlot {
        WidgetSlot::new(json!({"type": "markdown"}))
    }

    fn capture(doc: &DashboardDocument) -> Snapshot {
        let assembler =
            CaptureAssembler::new(DashboardScanner::new(TRACKED, DefaultNamer::new("Ultra Card")));
        Snapshot::from_new(7, assembler.capture(doc, SnapshotKind::Manual).unwrap())
    }

    fn sections(view: &View) -> &Vec<Section> {
        match &view.layout {
            ViewLayout::Sectioned { sections } => sections,
            ViewLayout::Flat { .. } => panic!("expected sectioned view"),
        }
    }

    fn numbers(cards: &[WidgetSlot]) -> Vec<u64> {
        cards
            .iter()
            .filter(|s| s.is_type(TRACKED))
            .map(|s| s.config()["n"].as_u64().unwrap())
            .collect()
    }

    fn legacy_card(view_path: &str, card_index: usize) -> CapturedCard {
        CapturedCard {
            config: json!({"type": TRACKED, "n": card_index}),
            card_index,
            section_index: None,
            card_index_in_section: None,
            view_path: Some(view_path.to_string()),
            view_id: None,
            card_name: None,
        }
    }

    fn legacy_snapshot(cards: Vec<CapturedCard>) -> Snapshot {
        Snapshot {
            id: 1,
            kind: SnapshotKind::Auto,
            created: chrono::Utc::now(),
            card_count: cards.len(),
            cards,
            views_breakdown: Default::default(),
            label: None,
        }
    }

    #[test]
    fn test_duplicates_are_removed_and_sections_rebuilt() {
        let original = DashboardDocument::new(vec![View::sectioned(
            "v1",
            "Dashboard",
            Some("dashboard"),
            vec![
                Section::new(vec![widget(1), widget(2)]),
                Section::new(vec![widget(3)]),
            ],
        )]);
        let snapshot = capture(&original);

        let duplicated = DashboardDocument::new(vec![View::sectioned(
            "v1",
            "Dashboard",
            Some("dashboard"),
            vec![
                Section::new(vec![widget(1), widget(1), widget(2), other(), widget(2)]),
                Section::new(vec![widget(3), widget(3)]),
            ],
        )]);

        let outcome = clean_restore(duplicated, &snapshot, TRACKED);

        assert_eq!(outcome.stats.deleted, 6);
        assert_eq!(outcome.stats.restored, 3);
        assert_eq!(outcome.stats.skipped, 0);
        assert_eq!(outcome.stats.approximated, 0);

        let rebuilt = sections(&outcome.document.views[0]);
        assert_eq!(numbers(&rebuilt[0].cards), vec![1, 2]);
        assert_eq!(numbers(&rebuilt[1].cards), vec![3]);
        // Unrelated widgets survive
        assert_eq!(rebuilt[0].cards.len(), 3);
    }

    #[test]
    fn test_sections_grow_to_fit_snapshot() {
        let original = DashboardDocument::new(vec![View::sectioned(
            "v1",
            "Dashboard",
            None,
            vec![
                Section::new(vec![widget(1)]),
                Section::new(vec![]),
                Section::new(vec![widget(2)]),
            ],
        )]);
        let snapshot = capture(&original);

        let shrunk = DashboardDocument::new(vec![View::sectioned(
            "v1",
            "Dashboard",
            None,
            vec![Section::new(vec![other()])],
        )]);

        let outcome = clean_restore(shrunk, &snapshot, TRACKED);

        let rebuilt = sections(&outcome.document.views[0]);
        assert_eq!(rebuilt.len(), 3);
        assert_eq!(numbers(&rebuilt[0].cards), vec![1]);
        assert!(rebuilt[1].cards.is_empty());
        assert_eq!(numbers(&rebuilt[2].cards), vec![2]);
    }

    #[test]
    fn test_legacy_snapshot_spreads_cards_evenly() {
        let live = DashboardDocument::new(vec![View::sectioned(
            "v1",
            "Dashboard",
            Some("dashboard"),
            vec![Section::new(vec![]), Section::new(vec![])],
        )]);
        // Stored out of order on purpose; card_index decides
        let snapshot = legacy_snapshot(
            [4, 0, 3, 1, 2]
                .into_iter()
                .map(|i| legacy_card("dashboard", i))
                .collect(),
        );

        let outcome = clean_restore(live, &snapshot, TRACKED);

        let rebuilt = sections(&outcome.document.views[0]);
        assert_eq!(numbers(&rebuilt[0].cards), vec![0, 1, 2]);
        assert_eq!(numbers(&rebuilt[1].cards), vec![3, 4]);
        assert_eq!(outcome.stats.restored, 5);
        assert_eq!(outcome.stats.approximated, 5);
    }

    #[test]
    fn test_legacy_snapshot_into_view_without_sections() {
        let live = DashboardDocument::new(vec![View::sectioned(
            "v1",
            "Dashboard",
            Some("dashboard"),
            vec![],
        )]);
        let snapshot = legacy_snapshot(vec![legacy_card("dashboard", 0), legacy_card("dashboard", 1)]);

        let outcome = clean_restore(live, &snapshot, TRACKED);

        let rebuilt = sections(&outcome.document.views[0]);
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(numbers(&rebuilt[0].cards), vec![0, 1]);
    }

    #[test]
    fn test_legacy_assignments_conserve_cards() {
        assert_eq!(legacy_assignments(5, 2), vec![0, 0, 0, 1, 1]);
        assert_eq!(legacy_assignments(4, 3), vec![0, 0, 1, 1]);
        assert_eq!(legacy_assignments(0, 3), Vec::<usize>::new());

        for total in 0..20 {
            for section_count in 1..6 {
                let assignments = legacy_assignments(total, section_count);
                assert_eq!(assignments.len(), total);
                assert!(assignments.iter().all(|&s| s < section_count));
            }
        }
    }

    #[test]
    fn test_flat_view_appends_in_capture_order() {
        let original = DashboardDocument::new(vec![View::flat(
            "v1",
            "Home",
            Some("home"),
            vec![widget(1), other(), widget(2), widget(3)],
        )]);
        let snapshot = capture(&original);

        let outcome = clean_restore(original.clone(), &snapshot, TRACKED);

        let live_view = &outcome.document.views[0];
        let ViewLayout::Flat { cards } = &live_view.layout else {
            panic!("expected flat view");
        };
        assert_eq!(numbers(cards), vec![1, 2, 3]);
        assert_eq!(cards[0], other());
        assert_eq!(outcome.stats.deleted, 3);
        assert_eq!(outcome.stats.restored, snapshot.card_count);
    }

    #[test]
    fn test_missing_view_cards_are_unplaced() {
        let original =
            DashboardDocument::new(vec![View::flat("v1", "Home", Some("home"), vec![widget(1)])]);
        let snapshot = capture(&original);

        let live = DashboardDocument::new(vec![View::flat("v2", "Other", Some("other"), vec![])]);

        let outcome = clean_restore(live, &snapshot, TRACKED);
        assert_eq!(outcome.stats.restored, 0);
        assert_eq!(outcome.stats.unplaced, 1);
    }

    #[test]
    fn test_renamed_view_path_binds_through_id() {
        let original =
            DashboardDocument::new(vec![View::flat("v1", "Home", Some("home"), vec![widget(1)])]);
        let snapshot = capture(&original);

        let live = DashboardDocument::new(vec![View::flat("v1", "Home", Some("house"), vec![])]);

        let outcome = clean_restore(live, &snapshot, TRACKED);
        assert_eq!(outcome.stats.restored, 1);
        assert_eq!(outcome.stats.unplaced, 0);

        let ViewLayout::Flat { cards } = &outcome.document.views[0].layout else {
            panic!("expected flat view");
        };
        assert_eq!(numbers(cards), vec![1]);
    }
}
