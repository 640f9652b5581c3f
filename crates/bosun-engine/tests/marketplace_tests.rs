// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marketplace install, update and refresh through the engine.

use std::time::Duration;

use bosun_core::{DataType, ErrorKind, PluginStatus};
use bosun_test_utils::fixtures::{driver_manifest, gps_driver, package_for};
use bosun_test_utils::TestHarness;

#[tokio::test]
async fn fresh_install_from_registry() {
    let h = TestHarness::builder().with_payload_dir().build().await.unwrap();
    h.registry.publish(&gps_driver(), b"gps payload").await;

    let instance = h
        .engine
        .install_from_marketplace("gps-driver", None)
        .await
        .unwrap();
    assert_eq!(instance.status, PluginStatus::Installed);
    assert_eq!(instance.installed_version, "1.0.0");

    let payload_dir = h.config.marketplace.payload_dir.clone().unwrap();
    let stored = std::fs::read(std::path::Path::new(&payload_dir).join("gps-driver-1.0.0.pkg"))
        .unwrap();
    assert_eq!(stored, b"gps payload");
}

#[tokio::test]
async fn update_preserves_surviving_mappings() {
    let h = TestHarness::builder().build().await.unwrap();
    let v1 = driver_manifest(
        "bmv",
        "1.0.0",
        &[("v", DataType::BATTERY_VOLTAGE), ("i", DataType::CURRENT)],
    );
    h.registry.publish(&v1, b"v1").await;
    h.engine.install_from_marketplace("bmv", None).await.unwrap();
    h.engine.enable("bmv").await.unwrap();
    h.engine.bind("battery_voltage", "bmv", "v").await.unwrap();
    h.engine.bind("battery_current", "bmv", "i").await.unwrap();

    let v2 = driver_manifest(
        "bmv",
        "1.1.0",
        &[("v", DataType::BATTERY_VOLTAGE), ("soc", DataType::PERCENTAGE)],
    );
    h.registry.publish(&v2, b"v2").await;

    let entries = h.engine.refresh_registry().await.unwrap();
    let entry = entries.iter().find(|e| e.id == "bmv").unwrap();
    assert!(entry.is_installed);
    assert!(entry.has_update);

    let updated = h
        .engine
        .install_from_marketplace("bmv", None)
        .await
        .unwrap();
    assert_eq!(updated.installed_version, "1.1.0");
    assert_eq!(updated.status, PluginStatus::Enabled);

    let snapshot = h.engine.snapshot();
    assert!(snapshot.mapping("battery_voltage").unwrap().active);
    assert!(snapshot.mapping("battery_current").is_none());
    assert!(snapshot.streams.iter().any(|s| s.stream_id == "soc"));
    assert_eq!(snapshot.instances.len(), 1);
}

#[tokio::test]
async fn failed_update_restores_status() {
    let h = TestHarness::builder().build().await.unwrap();
    h.registry.publish(&gps_driver(), b"v1").await;
    h.engine.install_from_marketplace("gps-driver", None).await.unwrap();
    h.engine.enable("gps-driver").await.unwrap();
    h.engine.bind("position", "gps-driver", "pos").await.unwrap();

    let mut v2 = gps_driver();
    v2.version = "2.0.0".to_string();
    let mut tampered = package_for(&v2, b"v2");
    tampered.sha256 = "00".repeat(32);
    h.registry.insert_document(tampered).await;

    let err = h
        .engine
        .install_from_marketplace("gps-driver", Some("2.0.0"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InstallFailed);

    let snapshot = h.engine.snapshot();
    let instance = snapshot.instance("gps-driver").unwrap();
    assert_eq!(instance.status, PluginStatus::Enabled);
    assert_eq!(instance.installed_version, "1.0.0");
    assert!(snapshot.mapping("position").unwrap().active);
}

#[tokio::test]
async fn unknown_plugin_fails_install() {
    let h = TestHarness::builder().build().await.unwrap();
    let err = h
        .engine
        .install_from_marketplace("ghost", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InstallFailed);
    assert!(h.engine.list_instances().is_empty());
}

#[tokio::test]
async fn refresh_failure_keeps_last_good_entries() {
    let h = TestHarness::builder().build().await.unwrap();
    h.registry.publish(&gps_driver(), b"v1").await;
    assert_eq!(h.engine.refresh_registry().await.unwrap().len(), 1);

    h.registry.set_unreachable(true);
    let err = h.engine.refresh_registry().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RegistryUnreachable);

    let cached = h.engine.registry_entries().unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(h.engine.search_registry("gps").unwrap().len(), 1);
    assert!(h.engine.search_registry("radar").unwrap().is_empty());
}

#[tokio::test]
async fn newer_refresh_supersedes_in_flight_one() {
    let h = TestHarness::builder().build().await.unwrap();
    h.registry.publish(&gps_driver(), b"v1").await;
    h.registry
        .set_listing_delay(Some(Duration::from_millis(300)))
        .await;

    let engine = h.engine.clone();
    let first = tokio::spawn(async move { engine.refresh_registry().await });
    while h.registry.listing_calls() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    h.registry.set_listing_delay(None).await;

    let second = h.engine.refresh_registry().await.unwrap();
    assert_eq!(second.len(), 1);
    let err = first.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RefreshSuperseded);
}

#[tokio::test]
async fn local_install_during_fetch_becomes_update() {
    let h = TestHarness::builder().with_payload_dir().build().await.unwrap();
    let v1 = driver_manifest("bmv", "1.0.0", &[("v", DataType::BATTERY_VOLTAGE)]);
    let v2 = driver_manifest("bmv", "1.1.0", &[("v", DataType::BATTERY_VOLTAGE)]);
    h.registry.publish(&v2, b"v2").await;
    h.registry
        .set_package_delay(Some(Duration::from_millis(300)))
        .await;

    let engine = h.engine.clone();
    let remote =
        tokio::spawn(async move { engine.install_from_marketplace("bmv", None).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.engine.install(v1).await.unwrap();
    h.engine.enable("bmv").await.unwrap();

    let updated = remote.await.unwrap().unwrap();
    assert_eq!(updated.installed_version, "1.1.0");
    assert_eq!(updated.status, PluginStatus::Enabled);
    assert_eq!(h.engine.list_instances().len(), 1);

    let payload_dir = h.config.marketplace.payload_dir.clone().unwrap();
    let stored =
        std::fs::read(std::path::Path::new(&payload_dir).join("bmv-1.1.0.pkg")).unwrap();
    assert_eq!(stored, b"v2");
}

#[tokio::test]
async fn unwritable_payload_rolls_back_fresh_install() {
    let h = TestHarness::builder().with_payload_dir().build().await.unwrap();
    h.registry.publish(&gps_driver(), b"gps payload").await;
    let payload_dir = h.config.marketplace.payload_dir.clone().unwrap();
    std::fs::write(&payload_dir, b"a file where the directory should be").unwrap();

    let err = h
        .engine
        .install_from_marketplace("gps-driver", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InstallFailed);
    assert!(h.engine.snapshot().instance("gps-driver").is_none());
}
