// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bundled built-in plugin catalog.
//!
//! Built-in manifests are compiled into the binary from `bundled/*.toml` and
//! seeded into the store on first start. No network calls are made.

use bosun_core::BosunError;

use crate::manifest::{parse_manifest_toml, PluginManifest};

/// `plugin.toml` sources of the built-in plugins.
const BUNDLED: &[(&str, &str)] = &[
    ("nmea0183.toml", include_str!("../bundled/nmea0183.toml")),
    (
        "instrument-panels.toml",
        include_str!("../bundled/instrument-panels.toml"),
    ),
];

/// Returns manifests for all built-in plugins.
///
/// The catalog contains:
/// - nmea0183 (driver)
/// - instrument-panels (ui-extension)
pub fn builtin_catalog() -> Result<Vec<PluginManifest>, BosunError> {
    BUNDLED
        .iter()
        .map(|(file, source)| {
            let manifest = parse_manifest_toml(source).map_err(|e| {
                BosunError::Internal(format!("bundled manifest {file} is broken: {e}"))
            })?;
            if !manifest.builtin {
                return Err(BosunError::Internal(format!(
                    "bundled manifest {file} must set builtin = true"
                )));
            }
            Ok(manifest)
        })
        .collect()
}
