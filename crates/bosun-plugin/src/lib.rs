// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifests, the installed-plugin store, and the stream catalog.
//!
//! Plugins are pluggable data-source drivers and dashboard extensions. Each
//! plugin has a manifest describing its identity and, for drivers, the data
//! streams it produces. The store tracks install/enable lifecycle; the stream
//! catalog is derived from the enabled drivers.

pub mod catalog;
pub mod manifest;
pub mod store;
pub mod streams;

pub use catalog::builtin_catalog;
pub use manifest::{
    parse_manifest_json, parse_manifest_toml, validate_manifest, DriverSection, PluginManifest,
    StreamSpec,
};
pub use store::{PluginInstance, PluginManifestStore};
pub use streams::{StreamCatalog, StreamDescriptor};
