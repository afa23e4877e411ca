//! Dashboard document model
//!
//! The live dashboard is a tree of views. Views are either flat (they own
//! widget slots directly) or sectioned (they own sections, which own slots).
//! Widget slots are kept as raw JSON so their configuration survives every
//! read/write cycle unchanged.

use crate::config::{WIDGET_NAME_KEY, WIDGET_TYPE_KEY};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root of the live dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardDocument {
    #[serde(default)]
    pub views: Vec<View>,
    /// Unknown top-level keys, preserved on write
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DashboardDocument {
    pub fn new(views: Vec<View>) -> Self {
        Self {
            views,
            extra: Map::new(),
        }
    }

    /// Count slots whose type matches `widget_type`
    pub fn count_widgets(&self, widget_type: &str) -> usize {
        self.views
            .iter()
            .map(|view| {
                view.slots()
                    .filter(|slot| slot.is_type(widget_type))
                    .count()
            })
            .sum()
    }
}

/// Kind of a view, without its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Flat,
    Sectioned,
}

/// Contents of a view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewLayout {
    Flat { cards: Vec<WidgetSlot> },
    Sectioned { sections: Vec<Section> },
}

impl ViewLayout {
    /// All slots in document order, mutably
    pub fn slots_mut(&mut self) -> Box<dyn Iterator<Item = &mut WidgetSlot> + '_> {
        match self {
            ViewLayout::Flat { cards } => Box::new(cards.iter_mut()),
            ViewLayout::Sectioned { sections } => {
                Box::new(sections.iter_mut().flat_map(|s| s.cards.iter_mut()))
            }
        }
    }

    /// Remove every slot of `widget_type`, returning how many were removed
    pub fn remove_widgets(&mut self, widget_type: &str) -> usize {
        let remove = |cards: &mut Vec<WidgetSlot>| {
            let before = cards.len();
            cards.retain(|slot| !slot.is_type(widget_type));
            before - cards.len()
        };

        match self {
            ViewLayout::Flat { cards } => remove(cards),
            ViewLayout::Sectioned { sections } => {
                sections.iter_mut().map(|s| remove(&mut s.cards)).sum()
            }
        }
    }
}

/// One navigable page of the dashboard
///
/// Serialized as a flat JSON object: `id`, `title`, `path`, either `cards`
/// or `sections`, an optional `kind` tag, plus any keys the host adds.
/// Keys the engine does not rewrite are written back exactly as read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct View {
    pub id: Option<String>,
    pub title: Option<String>,
    pub path: Option<String>,
    pub layout: ViewLayout,
    /// Every non-layout key as read, including the raw `id`/`title`/`path`
    pub extra: Map<String, Value>,
    /// Whether `cards`/`sections` must be written even when empty
    layout_key: bool,
}

impl View {
    pub fn flat(id: &str, title: &str, path: Option<&str>, cards: Vec<WidgetSlot>) -> Self {
        Self {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            path: path.map(str::to_string),
            layout: ViewLayout::Flat { cards },
            extra: Map::new(),
            layout_key: true,
        }
    }

    pub fn sectioned(id: &str, title: &str, path: Option<&str>, sections: Vec<Section>) -> Self {
        Self {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
            path: path.map(str::to_string),
            layout: ViewLayout::Sectioned { sections },
            extra: Map::new(),
            layout_key: true,
        }
    }

    pub fn kind(&self) -> ViewKind {
        match self.layout {
            ViewLayout::Flat { .. } => ViewKind::Flat,
            ViewLayout::Sectioned { .. } => ViewKind::Sectioned,
        }
    }

    /// Stable binding key: path first, id as fallback
    pub fn key(&self) -> Option<&str> {
        self.path.as_deref().or(self.id.as_deref())
    }

    /// Human-readable label used in snapshot breakdowns
    pub fn label(&self) -> String {
        [self.title.as_deref(), self.path.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or("Untitled")
            .to_string()
    }

    /// All slots of the view in document order
    pub fn slots(&self) -> Box<dyn Iterator<Item = &WidgetSlot> + '_> {
        match &self.layout {
            ViewLayout::Flat { cards } => Box::new(cards.iter()),
            ViewLayout::Sectioned { sections } => {
                Box::new(sections.iter().flat_map(|s| s.cards.iter()))
            }
        }
    }
}

/// String form of an identity key; numbers are accepted, anything else is absent
fn string_key(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Write `field` under `key` unless the raw value already reads as `field`
fn sync_key(map: &mut Map<String, Value>, key: &str, field: Option<String>) {
    if string_key(map.get(key)) == field {
        return;
    }
    match field {
        Some(value) => {
            map.insert(key.to_string(), Value::String(value));
        }
        None => {
            map.remove(key);
        }
    }
}

impl TryFrom<Map<String, Value>> for View {
    type Error = serde_json::Error;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = string_key(map.get("id"));
        let title = string_key(map.get("title"));
        let path = string_key(map.get("path"));

        let kind = match map.get("kind") {
            Some(value) => ViewKind::deserialize(value)?,
            None if map.contains_key("sections") => ViewKind::Sectioned,
            None => ViewKind::Flat,
        };

        let (layout, layout_key) = match kind {
            ViewKind::Flat => match map.remove("cards") {
                Some(cards) => (
                    ViewLayout::Flat {
                        cards: serde_json::from_value(cards)?,
                    },
                    true,
                ),
                None => (ViewLayout::Flat { cards: Vec::new() }, false),
            },
            ViewKind::Sectioned => match map.remove("sections") {
                Some(sections) => (
                    ViewLayout::Sectioned {
                        sections: serde_json::from_value(sections)?,
                    },
                    true,
                ),
                None => (ViewLayout::Sectioned { sections: Vec::new() }, false),
            },
        };

        Ok(Self {
            id,
            title,
            path,
            layout,
            extra: map,
            layout_key,
        })
    }
}

impl From<View> for Map<String, Value> {
    fn from(view: View) -> Self {
        let kind = view.kind();
        let mut map = view.extra;
        sync_key(&mut map, "id", view.id);
        sync_key(&mut map, "title", view.title);
        sync_key(&mut map, "path", view.path);

        if map.contains_key("kind") {
            let tag = match kind {
                ViewKind::Flat => "flat",
                ViewKind::Sectioned => "sectioned",
            };
            map.insert("kind".to_string(), Value::String(tag.to_string()));
        }

        match view.layout {
            ViewLayout::Flat { cards } => {
                if view.layout_key || !cards.is_empty() {
                    map.insert(
                        "cards".to_string(),
                        Value::Array(cards.into_iter().map(WidgetSlot::into_config).collect()),
                    );
                }
            }
            ViewLayout::Sectioned { sections } => {
                if view.layout_key || !sections.is_empty() {
                    map.insert(
                        "sections".to_string(),
                        Value::Array(sections.into_iter().map(Section::into_value).collect()),
                    );
                }
            }
        }
        map
    }
}

/// Sub-grouping of widgets inside a sectioned view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub cards: Vec<WidgetSlot>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Section {
    pub fn new(cards: Vec<WidgetSlot>) -> Self {
        Self {
            cards,
            extra: Map::new(),
        }
    }

    fn into_value(self) -> Value {
        let mut map = self.extra;
        map.insert(
            "cards".to_string(),
            Value::Array(self.cards.into_iter().map(WidgetSlot::into_config).collect()),
        );
        Value::Object(map)
    }
}

/// A single widget node, carried as opaque JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetSlot(Value);

impl WidgetSlot {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn widget_type(&self) -> Option<&str> {
        self.0.get(WIDGET_TYPE_KEY).and_then(Value::as_str)
    }

    pub fn is_type(&self, widget_type: &str) -> bool {
        self.widget_type() == Some(widget_type)
    }

    /// User-assigned name, if any (blank names count as absent)
    pub fn name(&self) -> Option<&str> {
        self.0
            .get(WIDGET_NAME_KEY)
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    /// The full widget configuration
    pub fn config(&self) -> &Value {
        &self.0
    }

    pub fn into_config(self) -> Value {
        self.0
    }
}

impl From<Value> for WidgetSlot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
