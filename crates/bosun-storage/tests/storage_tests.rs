// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for plugin and mapping persistence.

use bosun_core::{DataType, PluginStatus};
use bosun_plugin::PluginManifestStore;
use bosun_sensors::SensorMapping;
use bosun_storage::queries::{mappings::list_mappings, plugins::list_plugins};
use bosun_storage::{apply, load, Change, Database};
use bosun_test_utils::fixtures::driver_manifest;

fn mapping(slot: &str, plugin: &str, stream: &str, active: bool) -> SensorMapping {
    SensorMapping {
        slot_type: slot.to_string(),
        plugin_id: plugin.to_string(),
        stream_id: stream.to_string(),
        active,
        last_update: None,
        last_value: None,
    }
}

#[tokio::test]
async fn empty_database_loads_empty_state() {
    let db = Database::open_in_memory().await.unwrap();
    let state = load(&db).await.unwrap();
    assert!(state.plugins.is_empty());
    assert!(state.mappings.is_empty());
}

#[tokio::test]
async fn plugins_round_trip_in_install_order() {
    let db = Database::open_in_memory().await.unwrap();
    let mut store = PluginManifestStore::new();
    let zulu = store
        .install(driver_manifest("zulu", "1.0.0", &[("d", DataType::DEPTH)]))
        .unwrap();
    let alpha = store
        .install(driver_manifest("alpha", "2.1.0", &[("v", DataType::BATTERY_VOLTAGE)]))
        .unwrap();
    apply(&db, vec![Change::UpsertPlugin(zulu), Change::UpsertPlugin(alpha)])
        .await
        .unwrap();

    // Updating the first plugin must not move it to the end.
    store.enable("zulu").unwrap();
    store.report_error("zulu", "serial port closed").unwrap();
    let updated = store.get("zulu").unwrap().clone();
    apply(&db, vec![Change::UpsertPlugin(updated)]).await.unwrap();

    let plugins = list_plugins(&db).await.unwrap();
    let ids: Vec<&str> = plugins.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["zulu", "alpha"]);
    assert_eq!(plugins[0].status, PluginStatus::Error);
    assert_eq!(plugins[0].last_error.as_deref(), Some("serial port closed"));
    assert_eq!(plugins[1].installed_version, "2.1.0");
    assert_eq!(plugins[1].manifest, store.get("alpha").unwrap().manifest);
}

#[tokio::test]
async fn mappings_upsert_and_delete() {
    let db = Database::open_in_memory().await.unwrap();
    apply(
        &db,
        vec![
            Change::UpsertMapping(mapping("depth", "sounder", "d", true)),
            Change::UpsertMapping(mapping("battery_voltage", "house", "v", true)),
        ],
    )
    .await
    .unwrap();
    apply(
        &db,
        vec![
            Change::UpsertMapping(mapping("battery_voltage", "start", "v", false)),
            Change::DeleteMapping("depth".to_string()),
        ],
    )
    .await
    .unwrap();

    let mappings = list_mappings(&db).await.unwrap();
    assert_eq!(mappings, vec![mapping("battery_voltage", "start", "v", false)]);
}

#[tokio::test]
async fn failed_change_set_is_rolled_back() {
    let db = Database::open_in_memory().await.unwrap();
    apply(&db, vec![Change::UpsertMapping(mapping("depth", "sounder", "d", true))])
        .await
        .unwrap();

    // Drop the table underneath so the second statement of the batch fails.
    db.connection()
        .call(|conn| conn.execute_batch("DROP TABLE plugins;"))
        .await
        .unwrap();

    let result = apply(
        &db,
        vec![
            Change::DeleteMapping("depth".to_string()),
            Change::DeletePlugin("sounder".to_string()),
        ],
    )
    .await;
    assert!(result.is_err());
    assert_eq!(list_mappings(&db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("bosun.db");

    {
        let db = Database::open(&path, true).await.unwrap();
        let mut store = PluginManifestStore::new();
        let instance = store
            .install(driver_manifest("sounder", "1.0.0", &[("d", DataType::DEPTH)]))
            .unwrap();
        apply(
            &db,
            vec![
                Change::UpsertPlugin(instance),
                Change::UpsertMapping(mapping("depth", "sounder", "d", true)),
            ],
        )
        .await
        .unwrap();
        db.checkpoint().await.unwrap();
    }

    let db = Database::open(&path, true).await.unwrap();
    let state = load(&db).await.unwrap();
    assert_eq!(state.plugins.len(), 1);
    assert_eq!(state.mappings.len(), 1);
    assert!(state.mappings[0].last_value.is_none());
}
