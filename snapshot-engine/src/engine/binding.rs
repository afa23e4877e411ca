//! View binding
//!
//! Resolves captured cards to live views. A card's `view_path` is tried
//! against live paths first, then its `view_id` against live ids, so a view
//! whose path was renamed after capture still binds through its id.

use crate::document::View;
use crate::snapshot::CapturedCard;
use std::collections::BTreeMap;

/// Snapshot cards grouped by the live view they bind to
pub(crate) struct ViewBuckets<'a> {
    /// Live view index to cards, in capture order
    pub by_view: BTreeMap<usize, Vec<&'a CapturedCard>>,
    /// Cards with no view key or whose view no longer exists
    pub unplaced: usize,
}

/// Index of the live view `card` belongs to
pub fn resolve_view(views: &[View], card: &CapturedCard) -> Option<usize> {
    let by_path = card
        .view_path
        .as_deref()
        .and_then(|path| views.iter().position(|v| v.path.as_deref() == Some(path)));

    by_path.or_else(|| {
        card.view_id
            .as_deref()
            .and_then(|id| views.iter().position(|v| v.id.as_deref() == Some(id)))
    })
}

pub(crate) fn bucket_cards<'a>(views: &[View], cards: &'a [CapturedCard]) -> ViewBuckets<'a> {
    let mut buckets = ViewBuckets {
        by_view: BTreeMap::new(),
        unplaced: 0,
    };

    for card in cards {
        match resolve_view(views, card) {
            Some(index) => buckets.by_view.entry(index).or_default().push(card),
            None => {
                tracing::warn!(
                    "Captured widget {:?} from view {:?} has no live view; not placed",
                    card.card_name,
                    card.view_key()
                );
                buckets.unplaced += 1;
            }
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(path: Option<&str>, id: Option<&str>) -> CapturedCard {
        CapturedCard {
            config: json!({"type": "custom:ultra-card"}),
            card_index: 0,
            section_index: None,
            card_index_in_section: None,
            view_path: path.map(str::to_string),
            view_id: id.map(str::to_string),
            card_name: None,
        }
    }

    fn views() -> Vec<View> {
        vec![
            View::flat("v1", "Home", Some("house"), vec![]),
            View::flat("v2", "Rooms", Some("home"), vec![]),
            View::flat("v3", "Garage", None, vec![]),
        ]
    }

    #[test]
    fn test_path_wins_over_id() {
        assert_eq!(resolve_view(&views(), &card(Some("home"), Some("v1"))), Some(1));
    }

    #[test]
    fn test_id_used_when_path_was_renamed() {
        assert_eq!(resolve_view(&views(), &card(Some("old-path"), Some("v1"))), Some(0));
        assert_eq!(resolve_view(&views(), &card(None, Some("v3"))), Some(2));
    }

    #[test]
    fn test_unresolvable_cards_are_unplaced() {
        let views = views();
        let cards = vec![
            card(Some("home"), None),
            card(None, None),
            card(Some("gone"), Some("v9")),
            card(Some("house"), None),
        ];

        let buckets = bucket_cards(&views, &cards);

        assert_eq!(buckets.unplaced, 2);
        assert_eq!(buckets.by_view.len(), 2);
        assert_eq!(buckets.by_view[&0].len(), 1);
        assert_eq!(buckets.by_view[&1].len(), 1);
    }
}
