// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest and registry fixtures.

use base64::Engine as _;
use bosun_core::{DataType, PluginType};
use bosun_marketplace::{PackageDocument, RegistryListing};
use bosun_plugin::{DriverSection, PluginManifest, StreamSpec};
use sha2::{Digest, Sha256};

/// A driver manifest advertising `streams` as `(stream_id, data_type)`.
pub fn driver_manifest(id: &str, version: &str, streams: &[(&str, DataType)]) -> PluginManifest {
    PluginManifest {
        id: id.to_string(),
        name: format!("{id} driver"),
        version: version.to_string(),
        plugin_type: PluginType::Driver,
        author: "Test Author".to_string(),
        description: format!("Test driver {id}"),
        builtin: false,
        flag: None,
        driver: Some(DriverSection {
            protocol: "test".to_string(),
            data_streams: streams
                .iter()
                .map(|(stream_id, data_type)| StreamSpec {
                    id: stream_id.to_string(),
                    name: stream_id.to_string(),
                    data_type: data_type.clone(),
                })
                .collect(),
        }),
    }
}

/// A UI extension manifest; it has no streams.
pub fn ui_manifest(id: &str, version: &str) -> PluginManifest {
    PluginManifest {
        id: id.to_string(),
        name: format!("{id} panel"),
        version: version.to_string(),
        plugin_type: PluginType::UiExtension,
        author: "Test Author".to_string(),
        description: String::new(),
        builtin: false,
        flag: None,
        driver: None,
    }
}

/// The `gps-driver` with a single `pos` position stream.
pub fn gps_driver() -> PluginManifest {
    driver_manifest("gps-driver", "1.0.0", &[("pos", DataType::POSITION)])
}

/// A battery monitor advertising one voltage stream `v`.
pub fn battery_monitor(id: &str) -> PluginManifest {
    driver_manifest(id, "1.0.0", &[("v", DataType::BATTERY_VOLTAGE)])
}

/// The registry listing that advertises `manifest` as its latest version.
pub fn listing_for(manifest: &PluginManifest) -> RegistryListing {
    RegistryListing {
        id: manifest.id.clone(),
        name: manifest.name.clone(),
        plugin_type: manifest.plugin_type,
        author: manifest.author.clone(),
        latest_version: manifest.version.clone(),
        description: manifest.description.clone(),
        flag: manifest.flag.clone(),
    }
}

/// A package document with a correct digest for `payload`.
pub fn package_for(manifest: &PluginManifest, payload: &[u8]) -> PackageDocument {
    PackageDocument {
        manifest: manifest.clone(),
        payload: base64::engine::general_purpose::STANDARD.encode(payload),
        sha256: hex::encode(Sha256::digest(payload)),
    }
}
