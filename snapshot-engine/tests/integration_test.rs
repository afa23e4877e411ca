//! Integration tests for the snapshot engine
//!
//! These tests verify end-to-end functionality including:
//! - Capturing a dashboard file into the SQLite store
//! - Smart replace and clean restore written back to disk
//! - Schedule settings persistence

use serde_json::{json, Value};
use snapshot_engine::app::AppState;
use snapshot_engine::config::{AppConfig, EngineConfig, StoreConfig};
use snapshot_engine::database::{create_pool, Repository};
use snapshot_engine::document::{DocumentAccessor, JsonFileDocument};
use snapshot_engine::engine::RestoreStrategy;
use snapshot_engine::error::AppError;
use snapshot_engine::snapshot::{
    CapturedCard, NewSnapshot, SnapshotKind, SnapshotSettings, SnapshotSettingsUpdate,
};
use snapshot_engine::store::{SnapshotStore, SqliteSnapshotStore};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn dashboard() -> Value {
    json!({
        "title": "My Home",
        "views": [
            {
                "title": "Home",
                "path": "home",
                "icon": "mdi:home",
                "cards": [
                    {"type": "custom:ultra-card", "name": "Lights", "layout": {"rows": 2}},
                    {"type": "weather-forecast", "entity": "weather.home"},
                    {"type": "custom:ultra-card", "modules": ["clock"]}
                ]
            },
            {
                "title": "Rooms",
                "path": "rooms",
                "type": "sections",
                "sections": [
                    {"type": "grid", "cards": [{"type": "custom:ultra-card", "modules": ["kitchen"]}]},
                    {"type": "grid", "cards": [
                        {"type": "heading", "heading": "Bedroom"},
                        {"type": "custom:ultra-card", "name": "Bedroom Climate"}
                    ]}
                ]
            }
        ]
    })
}

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn test_config(temp_dir: &TempDir) -> AppConfig {
    AppConfig {
        data_dir: temp_dir.path().join("data"),
        document_path: temp_dir.path().join("dashboard.json"),
        store: StoreConfig::Sqlite {
            db_path: temp_dir.path().join("data").join("snapshots.sqlite"),
        },
        engine: EngineConfig::default(),
    }
}

/// Helper to create app state over a dashboard file and a SQLite store
async fn create_test_app(doc: &Value) -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);
    write_json(&config.document_path, doc);

    let state = AppState::initialize(config).await.unwrap();
    (state, temp_dir)
}

fn cards_of(doc: &Value, view: usize) -> Vec<Value> {
    let view = &doc["views"][view];
    match view.get("sections") {
        Some(sections) => sections
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|s| s["cards"].as_array().unwrap().clone())
            .collect(),
        None => view["cards"].as_array().unwrap().clone(),
    }
}

#[tokio::test]
async fn test_capture_edit_and_smart_replace() {
    let (state, _temp) = create_test_app(&dashboard()).await;
    let path = state.config.document_path.clone();

    let id = state.snapshots.create_manual_snapshot().await.unwrap();
    let snapshot = state.snapshots.get_snapshot(id).await.unwrap();
    assert_eq!(snapshot.card_count, 4);
    assert_eq!(snapshot.views_breakdown.get("Home"), Some(&2));
    assert_eq!(snapshot.views_breakdown.get("Rooms"), Some(&2));

    // User breaks two widgets and adds a new one
    let mut edited = read_json(&path);
    edited["views"][0]["cards"][0]["layout"] = json!({"rows": 9});
    edited["views"][0]["cards"][2]["modules"] = json!([]);
    edited["views"][1]["sections"][1]["cards"]
        .as_array_mut()
        .unwrap()
        .push(json!({"type": "custom:ultra-card", "name": "Brand New"}));
    write_json(&path, &edited);

    let stats = state
        .snapshots
        .restore_snapshot(id, RestoreStrategy::SmartReplace)
        .await
        .unwrap();

    assert_eq!(stats.restored, 4);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.deleted, 0);

    let restored = read_json(&path);
    assert_eq!(restored["title"], "My Home");
    assert_eq!(restored["views"][0]["icon"], "mdi:home");
    assert_eq!(restored["views"][0]["cards"][0]["layout"], json!({"rows": 2}));
    assert_eq!(restored["views"][0]["cards"][2]["modules"], json!(["clock"]));
    assert_eq!(
        restored["views"][0]["cards"][1],
        json!({"type": "weather-forecast", "entity": "weather.home"})
    );
    assert_eq!(
        restored["views"][1]["sections"][1]["cards"][2],
        json!({"type": "custom:ultra-card", "name": "Brand New"})
    );
    assert_eq!(restored["views"][1]["sections"][0]["type"], "grid");
}

#[tokio::test]
async fn test_clean_restore_rebuilds_file() {
    let (state, _temp) = create_test_app(&dashboard()).await;
    let path = state.config.document_path.clone();

    let id = state.snapshots.create_manual_snapshot().await.unwrap();
    let original = read_json(&path);

    // Remove every tracked widget and one section
    let mut edited = original.clone();
    edited["views"][0]["cards"] = json!([{"type": "weather-forecast", "entity": "weather.home"}]);
    edited["views"][1]["sections"] = json!([{"type": "grid", "cards": [{"type": "custom:ultra-card", "name": "Stray"}]}]);
    write_json(&path, &edited);

    let stats = state
        .snapshots
        .restore_snapshot(id, RestoreStrategy::CleanRestore)
        .await
        .unwrap();

    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.restored, 4);
    assert_eq!(stats.unplaced, 0);
    assert_eq!(stats.approximated, 0);

    let rebuilt = read_json(&path);
    let tracked = |cards: Vec<Value>| -> Vec<Value> {
        cards
            .into_iter()
            .filter(|c| c["type"] == "custom:ultra-card")
            .collect()
    };
    assert_eq!(tracked(cards_of(&rebuilt, 0)), tracked(cards_of(&original, 0)));
    assert_eq!(tracked(cards_of(&rebuilt, 1)), tracked(cards_of(&original, 1)));
    assert_eq!(rebuilt["views"][1]["sections"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_legacy_snapshot_spreads_cards_over_sections() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);
    std::fs::create_dir_all(&config.data_dir).unwrap();
    write_json(
        &config.document_path,
        &json!({
            "views": [{
                "title": "Rooms",
                "path": "rooms",
                "sections": [{"cards": []}, {"cards": []}]
            }]
        }),
    );

    let pool = create_pool(match &config.store {
        StoreConfig::Sqlite { db_path } => db_path,
        StoreConfig::Http { .. } => unreachable!(),
    })
    .await
    .unwrap();
    let store: Arc<dyn SnapshotStore> = Arc::new(SqliteSnapshotStore::new(Repository::new(pool)));

    let cards: Vec<CapturedCard> = (0..5)
        .map(|i| CapturedCard {
            config: json!({"type": "custom:ultra-card", "n": i}),
            card_index: i,
            section_index: None,
            card_index_in_section: None,
            view_path: Some("rooms".to_string()),
            view_id: None,
            card_name: None,
        })
        .collect();
    let id = store
        .create_snapshot(&NewSnapshot {
            kind: SnapshotKind::Manual,
            created: chrono::Utc::now(),
            card_count: cards.len(),
            cards,
            views_breakdown: BTreeMap::from([("Rooms".to_string(), 5)]),
        })
        .await
        .unwrap();

    let document: Arc<dyn DocumentAccessor> =
        Arc::new(JsonFileDocument::new(config.document_path.clone()));
    let state = AppState::with_parts(config, document, store).await.unwrap();

    let stats = state
        .snapshots
        .restore_snapshot(id, RestoreStrategy::CleanRestore)
        .await
        .unwrap();
    assert_eq!(stats.restored, 5);
    assert_eq!(stats.approximated, 5);

    let rebuilt = read_json(&state.config.document_path);
    let sections = rebuilt["views"][0]["sections"].as_array().unwrap();
    let sizes: Vec<usize> = sections
        .iter()
        .map(|s| s["cards"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![3, 2]);
    assert_eq!(sections[1]["cards"][0]["n"], 3);
}

#[tokio::test]
async fn test_empty_dashboard_creates_nothing() {
    let (state, _temp) = create_test_app(&json!({
        "views": [{"title": "Home", "cards": [{"type": "entities"}]}]
    }))
    .await;

    let result = state.snapshots.create_manual_snapshot().await;
    assert!(matches!(result, Err(AppError::EmptyCapture)));
    assert!(state.snapshots.list_snapshots(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_dashboard_file() {
    let temp_dir = TempDir::new().unwrap();
    let state = AppState::initialize(test_config(&temp_dir)).await.unwrap();

    let result = state.snapshots.create_manual_snapshot().await;
    assert!(matches!(result, Err(AppError::DocumentAccess(_))));
}

#[tokio::test]
async fn test_settings_round_trip() {
    let (state, _temp) = create_test_app(&dashboard()).await;

    assert_eq!(
        state.settings.get_settings().await.unwrap(),
        SnapshotSettings::default()
    );

    state
        .settings
        .update_settings(SnapshotSettingsUpdate {
            enabled: Some(false),
            time: Some("05:30".to_string()),
            timezone: Some("UTC".to_string()),
        })
        .await
        .unwrap();

    let settings = state.settings.get_settings().await.unwrap();
    assert!(!settings.enabled);
    assert_eq!(settings.time, "05:30");
    assert_eq!(settings.timezone, "UTC");
}

#[tokio::test]
async fn test_snapshot_lifecycle() {
    let (state, _temp) = create_test_app(&dashboard()).await;

    let manual = state.snapshots.create_manual_snapshot().await.unwrap();
    let auto = state.snapshots.run_auto_snapshot().await.unwrap();

    let items = state.snapshots.list_snapshots(None).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, auto);

    state
        .snapshots
        .rename_snapshot(manual, "Before theme change")
        .await
        .unwrap();
    assert!(matches!(
        state.snapshots.delete_snapshot(auto).await,
        Err(AppError::Validation(_))
    ));

    state.snapshots.delete_snapshot(manual).await.unwrap();
    let items = state.snapshots.list_snapshots(None).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, SnapshotKind::Auto);
}
