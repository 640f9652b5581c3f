// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-side views published by the writer.

use bosun_core::Timestamp;
use bosun_plugin::{PluginInstance, StreamDescriptor};
use bosun_sensors::freshness;
use bosun_sensors::{SensorMapping, SlotFreshness, TapEntry};
use serde::Serialize;

use crate::ingest::IngestStats;
use crate::state::EngineState;

/// Committed engine state as seen by readers.
///
/// Every snapshot satisfies the registry and mapping invariants; readers
/// never see a half-applied command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineSnapshot {
    /// Increases on every publish.
    pub version: u64,
    /// Installed plugins in install order.
    pub instances: Vec<PluginInstance>,
    /// Streams of enabled drivers.
    pub streams: Vec<StreamDescriptor>,
    /// Mappings in slot catalog order, with their cached values.
    pub mappings: Vec<SensorMapping>,
}

impl EngineSnapshot {
    pub(crate) fn capture(version: u64, state: &EngineState) -> Self {
        Self {
            version,
            instances: state.store.list_instances().to_vec(),
            streams: state.streams.available_streams().to_vec(),
            mappings: state.mappings.snapshot(),
        }
    }

    pub fn instance(&self, plugin_id: &str) -> Option<&PluginInstance> {
        self.instances.iter().find(|i| i.id() == plugin_id)
    }

    /// The mapping record for a slot, active or not.
    pub fn mapping(&self, slot_type: &str) -> Option<&SensorMapping> {
        self.mappings.iter().find(|m| m.slot_type == slot_type)
    }
}

/// What a monitor subscriber receives on every tick.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub generated_at: Timestamp,
    pub version: u64,
    pub mappings: Vec<SensorMapping>,
    pub freshness: Vec<SlotFreshness>,
    pub recent: Vec<TapEntry>,
    pub stats: IngestStats,
}

impl MonitorReport {
    pub(crate) fn build(
        snapshot: &EngineSnapshot,
        recent: Vec<TapEntry>,
        stats: IngestStats,
        now: Timestamp,
    ) -> Self {
        Self {
            generated_at: now,
            version: snapshot.version,
            mappings: snapshot.mappings.clone(),
            freshness: freshness::report(&snapshot.mappings, now),
            recent,
            stats,
        }
    }
}
