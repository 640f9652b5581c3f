// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry wire types, marketplace entries and package verification.

use base64::Engine as _;
use bosun_core::{BosunError, PluginType};
use bosun_plugin::{validate_manifest, PluginInstance, PluginManifest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One plugin as advertised by `GET {base}/plugins`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryListing {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    pub author: String,
    pub latest_version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

/// A registry listing joined with local install state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    pub author: String,
    pub latest_version: String,
    pub description: String,
    pub flag: Option<String>,
    pub is_installed: bool,
    /// The registry offers a newer semver than the installed one.
    pub has_update: bool,
}

/// Response of `GET {base}/plugins/{id}/{version|latest}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDocument {
    pub manifest: PluginManifest,
    /// Base64 encoded plugin payload.
    pub payload: String,
    /// Hex SHA-256 of the decoded payload.
    pub sha256: String,
}

/// A fetched package whose digest and manifest have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPackage {
    pub manifest: PluginManifest,
    pub payload: Vec<u8>,
}

/// Join listings with the installed instances.
pub fn entries_from_listings(
    listings: &[RegistryListing],
    installed: &[PluginInstance],
) -> Vec<RegistryEntry> {
    listings
        .iter()
        .map(|listing| {
            let instance = installed.iter().find(|i| i.id() == listing.id);
            RegistryEntry {
                id: listing.id.clone(),
                name: listing.name.clone(),
                plugin_type: listing.plugin_type,
                author: listing.author.clone(),
                latest_version: listing.latest_version.clone(),
                description: listing.description.clone(),
                flag: listing.flag.clone(),
                is_installed: instance.is_some(),
                has_update: instance
                    .is_some_and(|i| is_newer(&listing.latest_version, &i.installed_version)),
            }
        })
        .collect()
}

/// Whether `candidate` is a strictly greater semver than `current`.
///
/// Unparseable versions never count as an update.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (
        semver::Version::parse(candidate),
        semver::Version::parse(current),
    ) {
        (Ok(candidate), Ok(current)) => candidate > current,
        _ => false,
    }
}

/// Case-insensitive match on id, name and description. An empty query matches all.
pub fn search_entries(entries: Vec<RegistryEntry>, query: &str) -> Vec<RegistryEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|e| {
            e.id.to_lowercase().contains(&query)
                || e.name.to_lowercase().contains(&query)
                || e.description.to_lowercase().contains(&query)
        })
        .collect()
}

/// Decode and verify a package document.
///
/// Checks the payload digest, that the manifest belongs to `plugin_id`, the
/// requested version (if any) and the manifest shape.
pub fn verify_package(
    document: PackageDocument,
    plugin_id: &str,
    version: Option<&str>,
) -> Result<VerifiedPackage, BosunError> {
    let payload = base64::engine::general_purpose::STANDARD
        .decode(document.payload.trim())
        .map_err(|e| BosunError::install_failed(plugin_id, format!("payload is not base64: {e}")))?;

    let digest = hex::encode(Sha256::digest(&payload));
    if !digest.eq_ignore_ascii_case(document.sha256.trim()) {
        return Err(BosunError::install_failed(
            plugin_id,
            format!("payload digest mismatch: expected {}, got {digest}", document.sha256),
        ));
    }

    let manifest = document.manifest;
    if manifest.id != plugin_id {
        return Err(BosunError::install_failed(
            plugin_id,
            format!("registry returned manifest for `{}`", manifest.id),
        ));
    }
    if let Some(version) = version {
        if manifest.version != version {
            return Err(BosunError::install_failed(
                plugin_id,
                format!("requested version {version}, registry returned {}", manifest.version),
            ));
        }
    }
    validate_manifest(&manifest).map_err(|e| BosunError::install_failed(plugin_id, e.to_string()))?;

    Ok(VerifiedPackage { manifest, payload })
}
