// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store of installed plugins and their runtime status.
//!
//! The `PluginManifestStore` keeps [`PluginInstance`] records in install order.
//! It knows nothing about sensor mappings: callers that own both (the engine)
//! apply the mapping cascade after a successful uninstall or disable.

use bosun_core::{BosunError, PluginStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::manifest::{validate_manifest, PluginManifest};
use crate::streams::StreamCatalog;

/// Diagnostic recorded when a driver reports a fault without a message.
const UNSPECIFIED_FAULT: &str = "driver reported an unspecified fault";

/// An installed plugin together with its runtime status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInstance {
    pub manifest: PluginManifest,
    pub installed_version: String,
    pub status: PluginStatus,
    /// Diagnostic of the last runtime fault. Always set while status is `error`.
    pub last_error: Option<String>,
}

impl PluginInstance {
    fn new(manifest: PluginManifest) -> Self {
        Self {
            installed_version: manifest.version.clone(),
            manifest,
            status: PluginStatus::Installed,
            last_error: None,
        }
    }

    /// Plugin id, taken from the manifest.
    pub fn id(&self) -> &str {
        &self.manifest.id
    }
}

/// Installed plugins in install order.
#[derive(Debug, Clone, Default)]
pub struct PluginManifestStore {
    instances: Vec<PluginInstance>,
}

impl PluginManifestStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted instances, already in install order.
    ///
    /// A persisted `error` status without a diagnostic gets a placeholder so
    /// the status invariant holds after restore.
    pub fn from_instances(instances: Vec<PluginInstance>) -> Self {
        let instances = instances
            .into_iter()
            .map(|mut instance| {
                if instance.status == PluginStatus::Error && instance.last_error.is_none() {
                    instance.last_error = Some(UNSPECIFIED_FAULT.to_string());
                }
                instance
            })
            .collect();
        Self { instances }
    }

    /// Install a plugin from a manifest. The new instance starts as `installed`.
    pub fn install(&mut self, manifest: PluginManifest) -> Result<PluginInstance, BosunError> {
        validate_manifest(&manifest)?;
        if self.get(&manifest.id).is_some() {
            return Err(BosunError::DuplicatePlugin {
                plugin_id: manifest.id,
            });
        }

        let instance = PluginInstance::new(manifest);
        debug!(plugin_id = %instance.id(), version = %instance.installed_version, "plugin installed");
        self.instances.push(instance.clone());
        Ok(instance)
    }

    /// Remove a plugin. Built-in plugins are protected.
    pub fn uninstall(&mut self, plugin_id: &str) -> Result<PluginInstance, BosunError> {
        let index = self.index_of(plugin_id)?;
        if self.instances[index].manifest.builtin {
            return Err(BosunError::Protected {
                plugin_id: plugin_id.to_string(),
            });
        }
        Ok(self.instances.remove(index))
    }

    /// Enable a plugin, clearing any previous fault. Returns the previous status.
    pub fn enable(&mut self, plugin_id: &str) -> Result<PluginStatus, BosunError> {
        let instance = self.get_mut(plugin_id)?;
        let previous = instance.status;
        instance.status = PluginStatus::Enabled;
        instance.last_error = None;
        Ok(previous)
    }

    /// Disable a plugin. Returns the previous status.
    pub fn disable(&mut self, plugin_id: &str) -> Result<PluginStatus, BosunError> {
        let instance = self.get_mut(plugin_id)?;
        let previous = instance.status;
        instance.status = PluginStatus::Disabled;
        Ok(previous)
    }

    /// Mark a plugin as `loading` while an update is fetched. Returns the previous status.
    pub fn set_loading(&mut self, plugin_id: &str) -> Result<PluginStatus, BosunError> {
        let instance = self.get_mut(plugin_id)?;
        let previous = instance.status;
        instance.status = PluginStatus::Loading;
        Ok(previous)
    }

    /// Put a `loading` plugin back into `status`.
    ///
    /// Does nothing if the status was changed by someone else in the meantime.
    pub fn finish_loading(&mut self, plugin_id: &str, status: PluginStatus) -> Result<(), BosunError> {
        let instance = self.get_mut(plugin_id)?;
        if instance.status == PluginStatus::Loading {
            instance.status = status;
        }
        Ok(())
    }

    /// Record a driver runtime fault. The plugin and its manifest are kept.
    pub fn report_error(&mut self, plugin_id: &str, message: &str) -> Result<(), BosunError> {
        let instance = self.get_mut(plugin_id)?;
        let message = message.trim();
        instance.status = PluginStatus::Error;
        instance.last_error = Some(if message.is_empty() {
            UNSPECIFIED_FAULT.to_string()
        } else {
            message.to_string()
        });
        Ok(())
    }

    /// Replace the manifest of an installed plugin in place (update).
    ///
    /// Keeps the install position, status and fault diagnostic. Returns the
    /// replaced manifest.
    pub fn replace_manifest(&mut self, manifest: PluginManifest) -> Result<PluginManifest, BosunError> {
        validate_manifest(&manifest)?;
        let instance = self.get_mut(&manifest.id)?;
        instance.installed_version = manifest.version.clone();
        Ok(std::mem::replace(&mut instance.manifest, manifest))
    }

    /// Get a plugin instance by id.
    pub fn get(&self, plugin_id: &str) -> Option<&PluginInstance> {
        self.instances.iter().find(|i| i.id() == plugin_id)
    }

    /// Whether the plugin is installed and enabled.
    pub fn is_enabled(&self, plugin_id: &str) -> bool {
        self.get(plugin_id)
            .is_some_and(|i| i.status.publishes_streams())
    }

    /// All instances in install order.
    pub fn list_instances(&self) -> &[PluginInstance] {
        &self.instances
    }

    /// Derive the currently available streams.
    pub fn stream_catalog(&self) -> StreamCatalog {
        StreamCatalog::derive(&self.instances)
    }

    /// Returns the number of installed plugins.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if no plugins are installed.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn index_of(&self, plugin_id: &str) -> Result<usize, BosunError> {
        self.instances
            .iter()
            .position(|i| i.id() == plugin_id)
            .ok_or_else(|| BosunError::plugin_not_found(plugin_id))
    }

    fn get_mut(&mut self, plugin_id: &str) -> Result<&mut PluginInstance, BosunError> {
        let index = self.index_of(plugin_id)?;
        Ok(&mut self.instances[index])
    }
}
