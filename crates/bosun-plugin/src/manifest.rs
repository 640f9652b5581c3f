// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifest parsing and validation.
//!
//! Manifests arrive as JSON from the marketplace registry and as TOML
//! (`plugin.toml`) for bundled and locally supplied plugins. Both formats map
//! onto the same [`PluginManifest`] shape.

use std::collections::HashSet;

use bosun_core::{BosunError, DataType, PluginType};
use serde::{Deserialize, Serialize};

/// Declared identity and capabilities of a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    /// Stable plugin id (e.g., "gps-driver").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Semantic version string.
    pub version: String,
    /// Role of the plugin.
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Built-in plugins ship with the application and cannot be uninstalled.
    #[serde(default)]
    pub builtin: bool,
    /// Optional badge shown in the marketplace (e.g., "beta").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    /// Driver section, present only for driver plugins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverSection>,
}

/// The `driver` section of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSection {
    /// Wire protocol the driver speaks (e.g., "nmea0183", "ve.direct").
    pub protocol: String,
    #[serde(default)]
    pub data_streams: Vec<StreamSpec>,
}

/// One data stream a driver advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSpec {
    pub id: String,
    pub name: String,
    pub data_type: DataType,
}

impl PluginManifest {
    /// Streams declared by this manifest; empty for non-driver plugins.
    pub fn streams(&self) -> &[StreamSpec] {
        self.driver
            .as_ref()
            .map(|d| d.data_streams.as_slice())
            .unwrap_or(&[])
    }

    /// Looks up a declared stream by id.
    pub fn stream(&self, stream_id: &str) -> Option<&StreamSpec> {
        self.streams().iter().find(|s| s.id == stream_id)
    }

    /// Parsed semantic version. Only valid after [`validate_manifest`].
    pub fn semver(&self) -> Result<semver::Version, BosunError> {
        semver::Version::parse(&self.version).map_err(|e| {
            BosunError::InvalidManifest(format!(
                "plugin `{}`: version `{}` is not semver: {e}",
                self.id, self.version
            ))
        })
    }
}

/// Intermediate TOML deserialization struct for `plugin.toml`.
#[derive(Debug, Deserialize)]
struct PluginManifestFile {
    plugin: PluginManifest,
}

/// Parse and validate a manifest from registry JSON.
pub fn parse_manifest_json(json: &str) -> Result<PluginManifest, BosunError> {
    let manifest: PluginManifest = serde_json::from_str(json)
        .map_err(|e| BosunError::InvalidManifest(format!("malformed manifest JSON: {e}")))?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Parse and validate a manifest from a `plugin.toml` document.
///
/// The manifest lives under a `[plugin]` table, with streams declared as
/// `[[plugin.driver.dataStreams]]` entries.
pub fn parse_manifest_toml(toml_content: &str) -> Result<PluginManifest, BosunError> {
    let file: PluginManifestFile = toml::from_str(toml_content)
        .map_err(|e| BosunError::InvalidManifest(format!("malformed plugin.toml: {e}")))?;
    validate_manifest(&file.plugin)?;
    Ok(file.plugin)
}

/// Validate the shape of a manifest.
///
/// Checks required fields, the plugin id alphabet, semver, and that only
/// driver plugins declare a driver section with unique, non-empty streams.
pub fn validate_manifest(manifest: &PluginManifest) -> Result<(), BosunError> {
    if manifest.id.trim().is_empty() {
        return Err(BosunError::InvalidManifest(
            "plugin manifest: id must not be empty".to_string(),
        ));
    }

    if !manifest
        .id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
    {
        return Err(BosunError::InvalidManifest(format!(
            "plugin manifest: id `{}` may only contain lowercase letters, digits, '-', '_' and '.'",
            manifest.id
        )));
    }

    for (field, value) in [("name", &manifest.name), ("author", &manifest.author)] {
        if value.trim().is_empty() {
            return Err(BosunError::InvalidManifest(format!(
                "plugin manifest `{}`: {field} must not be empty",
                manifest.id
            )));
        }
    }

    manifest.semver()?;

    match (manifest.plugin_type, &manifest.driver) {
        (PluginType::Driver, None) => {
            return Err(BosunError::InvalidManifest(format!(
                "plugin manifest `{}`: driver plugins must declare a driver section",
                manifest.id
            )));
        }
        (PluginType::Driver, Some(driver)) => validate_driver(&manifest.id, driver)?,
        (other, Some(_)) => {
            return Err(BosunError::InvalidManifest(format!(
                "plugin manifest `{}`: only driver plugins declare data streams, found type {other}",
                manifest.id
            )));
        }
        (_, None) => {}
    }

    Ok(())
}

fn validate_driver(plugin_id: &str, driver: &DriverSection) -> Result<(), BosunError> {
    if driver.protocol.trim().is_empty() {
        return Err(BosunError::InvalidManifest(format!(
            "plugin manifest `{plugin_id}`: driver.protocol must not be empty"
        )));
    }

    let mut seen = HashSet::new();
    for stream in &driver.data_streams {
        if stream.id.trim().is_empty() || stream.name.trim().is_empty() {
            return Err(BosunError::InvalidManifest(format!(
                "plugin manifest `{plugin_id}`: data streams need a non-empty id and name"
            )));
        }
        if stream.data_type.as_str().trim().is_empty() {
            return Err(BosunError::InvalidManifest(format!(
                "plugin manifest `{plugin_id}`: stream `{}` has an empty dataType",
                stream.id
            )));
        }
        if !seen.insert(stream.id.as_str()) {
            return Err(BosunError::InvalidManifest(format!(
                "plugin manifest `{plugin_id}`: duplicate stream id `{}`",
                stream.id
            )));
        }
    }

    Ok(())
}
