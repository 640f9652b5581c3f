// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence operations produced by engine commands.

use bosun_plugin::PluginInstance;
use bosun_sensors::SensorMapping;

/// One row-level change. A command's changes are applied in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    UpsertPlugin(PluginInstance),
    DeletePlugin(String),
    UpsertMapping(SensorMapping),
    DeleteMapping(String),
}

/// Everything persisted, as loaded on start.
#[derive(Debug, Clone, Default)]
pub struct PersistedState {
    /// Plugin instances in install order.
    pub plugins: Vec<PluginInstance>,
    pub mappings: Vec<SensorMapping>,
}
