// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing table binding sensor slots to live streams.
//!
//! The table holds at most one [`SensorMapping`] record per slot. A record is
//! either active (receives live values) or inactive (its plugin was disabled).
//! Invariants upheld by every operation:
//! - at most one active mapping per slot;
//! - a mapping only references a stream whose data type equals the slot's
//!   expected data type;
//! - mappings of disabled or uninstalled plugins are never active.

use std::collections::{BTreeMap, HashMap, HashSet};

use bosun_core::{BosunError, DataType, SensorValue, Timestamp};
use bosun_plugin::{PluginInstance, PluginManifest, StreamCatalog};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, info};

use crate::slots::SlotCatalog;

/// An active or deactivated binding of one slot to one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorMapping {
    pub slot_type: String,
    pub plugin_id: String,
    pub stream_id: String,
    pub active: bool,
    pub last_update: Option<Timestamp>,
    pub last_value: Option<SensorValue>,
}

impl SensorMapping {
    fn new(slot_type: &str, plugin_id: &str, stream_id: &str) -> Self {
        Self {
            slot_type: slot_type.to_string(),
            plugin_id: plugin_id.to_string(),
            stream_id: stream_id.to_string(),
            active: true,
            last_update: None,
            last_value: None,
        }
    }

    fn targets(&self, plugin_id: &str, stream_id: &str) -> bool {
        self.plugin_id == plugin_id && self.stream_id == stream_id
    }
}

/// Why an ingested value was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The stream is unknown or its plugin is not enabled.
    UnknownStream,
    /// The value does not have the shape of the stream's data type.
    MalformedValue,
    /// The sample is older than the value already held.
    OutOfOrder,
}

/// Result of pushing one value through [`MappingTable::ingest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The value was stored on this many active mappings.
    Applied(usize),
    /// The stream is valid but no active mapping consumes it.
    Unmapped,
    Rejected(RejectReason),
}

/// Slot-to-stream routing table.
#[derive(Debug, Clone)]
pub struct MappingTable {
    slots: SlotCatalog,
    mappings: HashMap<String, SensorMapping>,
}

impl MappingTable {
    /// Create an empty table over a slot catalog.
    pub fn new(slots: SlotCatalog) -> Self {
        Self {
            slots,
            mappings: HashMap::new(),
        }
    }

    /// Rebuild a table from persisted records.
    ///
    /// Records for unknown slots, unknown plugins, streams the manifest no
    /// longer declares, or mismatched data types are discarded. Records whose
    /// plugin is installed or disabled are restored inactive. Returns the
    /// table and the number of discarded records.
    pub fn restore(
        slots: SlotCatalog,
        records: Vec<SensorMapping>,
        instances: &[PluginInstance],
    ) -> (Self, usize) {
        let mut table = Self::new(slots);
        let mut discarded = 0;

        for mut record in records {
            let expected = table.slots.get(&record.slot_type).map(|s| &s.expected_data_type);
            let instance = instances.iter().find(|i| i.id() == record.plugin_id);
            let declared = instance
                .and_then(|i| i.manifest.stream(&record.stream_id))
                .map(|s| &s.data_type);

            match (expected, declared) {
                (Some(expected), Some(declared)) if expected == declared => {
                    let retained = instance.is_some_and(|i| i.status.retains_mappings());
                    record.active = record.active && retained;
                    table.mappings.insert(record.slot_type.clone(), record);
                }
                _ => {
                    debug!(slot_type = %record.slot_type, plugin_id = %record.plugin_id, "discarding stale persisted mapping");
                    discarded += 1;
                }
            }
        }

        (table, discarded)
    }

    /// The slot catalog this table validates against.
    pub fn slot_catalog(&self) -> &SlotCatalog {
        &self.slots
    }

    /// Bind a slot to a stream, replacing any existing mapping for the slot.
    ///
    /// Last bind wins. Rebinding the mapping that is already active is a
    /// no-op that keeps its cached value. Returns the replaced record, if any.
    pub fn bind(
        &mut self,
        slot_type: &str,
        plugin_id: &str,
        stream_id: &str,
        streams: &StreamCatalog,
    ) -> Result<Option<SensorMapping>, BosunError> {
        let slot = self
            .slots
            .get(slot_type)
            .ok_or_else(|| BosunError::SlotNotFound {
                slot_type: slot_type.to_string(),
            })?;
        let stream = streams
            .find(plugin_id, stream_id)
            .ok_or_else(|| BosunError::stream_not_found(plugin_id, stream_id))?;
        if stream.data_type != slot.expected_data_type {
            return Err(BosunError::TypeMismatch {
                slot_type: slot_type.to_string(),
                expected: slot.expected_data_type.to_string(),
                actual: stream.data_type.to_string(),
            });
        }

        let unchanged = self
            .mappings
            .get(slot_type)
            .is_some_and(|m| m.active && m.targets(plugin_id, stream_id));
        if unchanged {
            return Ok(None);
        }

        let replaced = self.mappings.insert(
            slot_type.to_string(),
            SensorMapping::new(slot_type, plugin_id, stream_id),
        );
        info!(slot_type, plugin_id, stream_id, "sensor slot bound");
        Ok(replaced)
    }

    /// Remove a mapping, but only if it targets exactly this stream.
    ///
    /// A request that no longer matches (the slot was rebound in the
    /// meantime) is a silent no-op. Returns whether a mapping was removed.
    pub fn unbind(&mut self, slot_type: &str, plugin_id: &str, stream_id: &str) -> bool {
        let matches = self
            .mappings
            .get(slot_type)
            .is_some_and(|m| m.targets(plugin_id, stream_id));
        if matches {
            self.mappings.remove(slot_type);
            info!(slot_type, plugin_id, stream_id, "sensor slot unbound");
        }
        matches
    }

    /// Bind the plugin's streams to slots wherever the match is unambiguous.
    ///
    /// Unmapped slots and not-yet-bound available streams are grouped by data
    /// type. A group is bound only when it holds exactly one slot and exactly
    /// one stream, and that stream belongs to `plugin_id`. Ties are skipped.
    /// Returns the new mappings in slot catalog order.
    pub fn auto_map(&mut self, plugin_id: &str, streams: &StreamCatalog) -> Vec<SensorMapping> {
        let bound: HashSet<(&str, &str)> = self
            .mappings
            .values()
            .filter(|m| m.active)
            .map(|m| (m.plugin_id.as_str(), m.stream_id.as_str()))
            .collect();

        let mut candidates: BTreeMap<&DataType, Vec<(&str, &str)>> = BTreeMap::new();
        for stream in streams.available_streams() {
            let key = (stream.plugin_id.as_str(), stream.stream_id.as_str());
            if !bound.contains(&key) {
                candidates.entry(&stream.data_type).or_default().push(key);
            }
        }

        let mut unmapped: BTreeMap<&DataType, Vec<&str>> = BTreeMap::new();
        for slot in self.slots.slots() {
            let mapped = self.mappings.get(slot.slot_type).is_some_and(|m| m.active);
            if !mapped {
                unmapped
                    .entry(&slot.expected_data_type)
                    .or_default()
                    .push(slot.slot_type);
            }
        }

        let mut picks: Vec<(&'static str, &str)> = Vec::new();
        for (data_type, slot_types) in &unmapped {
            let [slot_type] = slot_types.as_slice() else {
                continue;
            };
            let Some(group) = candidates.get(data_type) else {
                continue;
            };
            if let [(owner, stream_id)] = group.as_slice() {
                if *owner == plugin_id {
                    picks.push((*slot_type, *stream_id));
                }
            }
        }
        picks.sort_by_key(|(slot_type, _)| self.slots.position(slot_type));

        let created: Vec<SensorMapping> = picks
            .into_iter()
            .map(|(slot_type, stream_id)| SensorMapping::new(slot_type, plugin_id, stream_id))
            .collect();
        for mapping in &created {
            self.mappings.insert(mapping.slot_type.clone(), mapping.clone());
        }

        if !created.is_empty() {
            info!(plugin_id, count = created.len(), "auto-mapped sensor slots");
        }
        created
    }

    /// Push one live value into the table.
    pub fn ingest(
        &mut self,
        plugin_id: &str,
        stream_id: &str,
        value: &SensorValue,
        timestamp: Timestamp,
        streams: &StreamCatalog,
    ) -> IngestOutcome {
        let Some(stream) = streams.find(plugin_id, stream_id) else {
            return IngestOutcome::Rejected(RejectReason::UnknownStream);
        };
        if !stream.data_type.accepts(value) {
            return IngestOutcome::Rejected(RejectReason::MalformedValue);
        }

        let mut applied = 0;
        let mut outdated = false;
        for mapping in self
            .mappings
            .values_mut()
            .filter(|m| m.active && m.targets(plugin_id, stream_id))
        {
            if mapping.last_update.is_some_and(|last| timestamp < last) {
                outdated = true;
                continue;
            }
            mapping.last_update = Some(timestamp);
            mapping.last_value = Some(value.clone());
            applied += 1;
        }

        match (applied, outdated) {
            (0, true) => IngestOutcome::Rejected(RejectReason::OutOfOrder),
            (0, false) => IngestOutcome::Unmapped,
            (n, _) => IngestOutcome::Applied(n),
        }
    }

    /// Deactivate every mapping of a plugin (plugin disabled). Returns the count.
    pub fn deactivate_plugin(&mut self, plugin_id: &str) -> usize {
        let mut count = 0;
        for mapping in self
            .mappings
            .values_mut()
            .filter(|m| m.active && m.plugin_id == plugin_id)
        {
            mapping.active = false;
            count += 1;
        }
        count
    }

    /// Delete every mapping of a plugin (plugin uninstalled). Returns the removed slot types.
    pub fn remove_plugin(&mut self, plugin_id: &str) -> Vec<String> {
        let removed: Vec<String> = self
            .mappings
            .values()
            .filter(|m| m.plugin_id == plugin_id)
            .map(|m| m.slot_type.clone())
            .collect();
        for slot_type in &removed {
            self.mappings.remove(slot_type);
        }
        removed
    }

    /// Drop mappings whose stream vanished from an updated manifest.
    ///
    /// Mappings survive when the new manifest still declares the stream id with
    /// the slot's data type. Returns the removed slot types.
    pub fn retain_plugin_streams(&mut self, manifest: &PluginManifest) -> Vec<String> {
        let slots = &self.slots;
        let removed: Vec<String> = self
            .mappings
            .values()
            .filter(|m| m.plugin_id == manifest.id)
            .filter(|m| {
                let expected = slots.get(&m.slot_type).map(|s| &s.expected_data_type);
                let declared = manifest.stream(&m.stream_id).map(|s| &s.data_type);
                expected.is_none() || expected != declared
            })
            .map(|m| m.slot_type.clone())
            .collect();
        for slot_type in &removed {
            self.mappings.remove(slot_type);
        }
        removed
    }

    /// The mapping record of a slot, active or not.
    pub fn get(&self, slot_type: &str) -> Option<&SensorMapping> {
        self.mappings.get(slot_type)
    }

    /// All mapping records ordered by slot catalog position.
    pub fn snapshot(&self) -> Vec<SensorMapping> {
        let mut mappings: Vec<SensorMapping> = self.mappings.values().cloned().collect();
        mappings.sort_by_key(|m| self.slots.position(&m.slot_type));
        mappings
    }

    /// Number of active mappings.
    pub fn active_count(&self) -> usize {
        self.mappings.values().filter(|m| m.active).count()
    }

    /// Number of mapping records, active or not.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// True when no slot has a mapping record.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bosun_core::{ErrorKind, PluginStatus, PluginType};
    use bosun_plugin::{DriverSection, PluginManifestStore, StreamSpec};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    fn driver(id: &str, streams: &[(&str, DataType)]) -> PluginManifest {
        PluginManifest {
            id: id.to_string(),
            name: id.to_string(),
            version: "1.0.0".to_string(),
            plugin_type: PluginType::Driver,
            author: "test".to_string(),
            description: String::new(),
            builtin: false,
            flag: None,
            driver: Some(DriverSection {
                protocol: "test".to_string(),
                data_streams: streams
                    .iter()
                    .map(|(sid, dt)| StreamSpec {
                        id: sid.to_string(),
                        name: sid.to_string(),
                        data_type: dt.clone(),
                    })
                    .collect(),
            }),
        }
    }

    fn enabled_store(manifests: Vec<PluginManifest>) -> PluginManifestStore {
        let mut store = PluginManifestStore::new();
        for manifest in manifests {
            let id = manifest.id.clone();
            store.install(manifest).unwrap();
            store.enable(&id).unwrap();
        }
        store
    }

    fn t(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn bind_validates_slot_stream_and_type() {
        let store = enabled_store(vec![driver("gps", &[("pos", DataType::POSITION)])]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());

        let err = table.bind("bilge", "gps", "pos", &streams).unwrap_err();
        assert!(matches!(err, BosunError::SlotNotFound { .. }));

        let err = table.bind("position", "gps", "nope", &streams).unwrap_err();
        assert!(matches!(err, BosunError::StreamNotFound { .. }));

        let err = table.bind("depth", "gps", "pos", &streams).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        assert!(table.is_empty());
        table.bind("position", "gps", "pos", &streams).unwrap();
        assert!(table.get("position").unwrap().active);
    }

    #[test]
    fn bind_rejects_streams_of_non_enabled_plugins() {
        let mut store = PluginManifestStore::new();
        store.install(driver("gps", &[("pos", DataType::POSITION)])).unwrap();
        let mut table = MappingTable::new(SlotCatalog::marine());
        let err = table
            .bind("position", "gps", "pos", &store.stream_catalog())
            .unwrap_err();
        assert!(matches!(err, BosunError::StreamNotFound { .. }));
    }

    #[test]
    fn last_bind_wins() {
        let store = enabled_store(vec![
            driver("house", &[("v", DataType::BATTERY_VOLTAGE)]),
            driver("start", &[("v", DataType::BATTERY_VOLTAGE)]),
        ]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());

        table.bind("battery_voltage", "house", "v", &streams).unwrap();
        let replaced = table.bind("battery_voltage", "start", "v", &streams).unwrap();
        assert_eq!(replaced.unwrap().plugin_id, "house");
        assert_eq!(table.active_count(), 1);
        assert_eq!(table.get("battery_voltage").unwrap().plugin_id, "start");
    }

    #[test]
    fn rebinding_same_stream_keeps_cached_value() {
        let store = enabled_store(vec![driver("sounder", &[("d", DataType::DEPTH)])]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());
        table.bind("depth", "sounder", "d", &streams).unwrap();
        table.ingest("sounder", "d", &json!(4.2), t(0), &streams);

        assert!(table.bind("depth", "sounder", "d", &streams).unwrap().is_none());
        assert_eq!(table.get("depth").unwrap().last_value, Some(json!(4.2)));
    }

    #[test]
    fn unbind_requires_exact_match() {
        let store = enabled_store(vec![
            driver("house", &[("v", DataType::BATTERY_VOLTAGE)]),
            driver("start", &[("v", DataType::BATTERY_VOLTAGE)]),
        ]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());
        table.bind("battery_voltage", "start", "v", &streams).unwrap();

        // A stale request for the previous binding must not remove the new one.
        assert!(!table.unbind("battery_voltage", "house", "v"));
        assert!(table.get("battery_voltage").is_some());

        assert!(table.unbind("battery_voltage", "start", "v"));
        assert!(table.get("battery_voltage").is_none());
    }

    #[test]
    fn gps_scenario_auto_map_then_ingest() {
        let store = enabled_store(vec![driver("gps-driver", &[("pos", DataType::POSITION)])]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());

        let created = table.auto_map("gps-driver", &streams);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].slot_type, "position");
        assert_eq!(created[0].stream_id, "pos");

        let value = json!({"lat": 10, "lon": 20});
        let outcome = table.ingest("gps-driver", "pos", &value, t(0), &streams);
        assert_eq!(outcome, IngestOutcome::Applied(1));

        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].last_value, Some(value));
        assert_eq!(snapshot[0].last_update, Some(t(0)));
    }

    #[test]
    fn ambiguous_streams_are_not_auto_mapped() {
        let store = enabled_store(vec![
            driver("house", &[("v", DataType::BATTERY_VOLTAGE)]),
            driver("start", &[("v", DataType::BATTERY_VOLTAGE)]),
        ]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());

        assert!(table.auto_map("house", &streams).is_empty());
        assert!(table.auto_map("start", &streams).is_empty());
        assert!(table.get("battery_voltage").is_none());

        table.bind("battery_voltage", "house", "v", &streams).unwrap();
        assert_eq!(table.get("battery_voltage").unwrap().plugin_id, "house");
    }

    #[test]
    fn ambiguous_slots_are_not_auto_mapped() {
        // Two speed slots compete for one speed stream.
        let store = enabled_store(vec![driver("log", &[("stw", DataType::SPEED)])]);
        let mut table = MappingTable::new(SlotCatalog::marine());
        assert!(table.auto_map("log", &store.stream_catalog()).is_empty());
    }

    #[test]
    fn auto_map_only_binds_the_requested_plugin() {
        let store = enabled_store(vec![
            driver("gps", &[("pos", DataType::POSITION)]),
            driver("sounder", &[("d", DataType::DEPTH)]),
        ]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());

        let created = table.auto_map("gps", &streams);
        assert_eq!(created.len(), 1);
        assert!(table.get("depth").is_none());
    }

    #[test]
    fn auto_map_is_idempotent() {
        let store = enabled_store(vec![driver(
            "multi",
            &[
                ("pos", DataType::POSITION),
                ("d", DataType::DEPTH),
                ("rpm", DataType::RPM),
                ("sog", DataType::SPEED),
            ],
        )]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());

        let first = table.auto_map("multi", &streams);
        let slots: Vec<&str> = first.iter().map(|m| m.slot_type.as_str()).collect();
        assert_eq!(slots, vec!["position", "depth", "engine_rpm"]);

        let before = table.snapshot();
        assert!(table.auto_map("multi", &streams).is_empty());
        assert_eq!(table.snapshot(), before);
    }

    #[test]
    fn auto_map_ignores_streams_already_bound_elsewhere() {
        let store = enabled_store(vec![
            driver("a", &[("d", DataType::DEPTH)]),
            driver("b", &[("d", DataType::DEPTH)]),
        ]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::new(vec![
            crate::slots::SlotDefinition {
                slot_type: "depth",
                label: "Depth",
                category: crate::slots::SlotCategory::Depth,
                expected_data_type: DataType::DEPTH,
            },
            crate::slots::SlotDefinition {
                slot_type: "depth_keel",
                label: "Depth below keel",
                category: crate::slots::SlotCategory::Depth,
                expected_data_type: DataType::DEPTH,
            },
        ]));

        table.bind("depth", "a", "d", &streams).unwrap();
        let created = table.auto_map("b", &streams);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].slot_type, "depth_keel");
    }

    #[test]
    fn ingest_rejects_unknown_and_malformed() {
        let store = enabled_store(vec![driver("gps", &[("pos", DataType::POSITION)])]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());
        table.bind("position", "gps", "pos", &streams).unwrap();

        assert_eq!(
            table.ingest("gps", "nope", &json!(1), t(0), &streams),
            IngestOutcome::Rejected(RejectReason::UnknownStream)
        );
        assert_eq!(
            table.ingest("gps", "pos", &json!("north"), t(0), &streams),
            IngestOutcome::Rejected(RejectReason::MalformedValue)
        );
        assert!(table.get("position").unwrap().last_update.is_none());
    }

    #[test]
    fn ingest_without_mapping_is_unmapped() {
        let store = enabled_store(vec![driver("sounder", &[("d", DataType::DEPTH)])]);
        let mut table = MappingTable::new(SlotCatalog::marine());
        assert_eq!(
            table.ingest("sounder", "d", &json!(3.0), t(0), &store.stream_catalog()),
            IngestOutcome::Unmapped
        );
    }

    #[test]
    fn ingest_ignores_out_of_order_samples() {
        let store = enabled_store(vec![driver("sounder", &[("d", DataType::DEPTH)])]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());
        table.bind("depth", "sounder", "d", &streams).unwrap();

        table.ingest("sounder", "d", &json!(3.0), t(5), &streams);
        assert_eq!(
            table.ingest("sounder", "d", &json!(2.0), t(1), &streams),
            IngestOutcome::Rejected(RejectReason::OutOfOrder)
        );
        assert_eq!(table.get("depth").unwrap().last_value, Some(json!(3.0)));
    }

    #[test]
    fn deactivated_mappings_do_not_receive_values() {
        let mut store = enabled_store(vec![driver("sounder", &[("d", DataType::DEPTH)])]);
        let mut table = MappingTable::new(SlotCatalog::marine());
        table.bind("depth", "sounder", "d", &store.stream_catalog()).unwrap();

        store.disable("sounder").unwrap();
        assert_eq!(table.deactivate_plugin("sounder"), 1);
        assert!(!table.get("depth").unwrap().active);

        // Re-enabling does not reactivate the mapping.
        store.enable("sounder").unwrap();
        let streams = store.stream_catalog();
        assert_eq!(
            table.ingest("sounder", "d", &json!(3.0), t(0), &streams),
            IngestOutcome::Unmapped
        );
        assert!(!table.get("depth").unwrap().active);

        // The slot counts as unmapped again, so auto-map can rebind it.
        assert_eq!(table.auto_map("sounder", &streams).len(), 1);
        assert!(table.get("depth").unwrap().active);
    }

    #[test]
    fn remove_plugin_deletes_all_its_mappings() {
        let store = enabled_store(vec![
            driver("gps", &[("pos", DataType::POSITION)]),
            driver("sounder", &[("d", DataType::DEPTH)]),
        ]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());
        table.bind("position", "gps", "pos", &streams).unwrap();
        table.bind("depth", "sounder", "d", &streams).unwrap();
        table.deactivate_plugin("gps");

        assert_eq!(table.remove_plugin("gps"), vec!["position".to_string()]);
        assert!(table.get("position").is_none());
        assert!(table.get("depth").is_some());
    }

    #[test]
    fn retain_plugin_streams_drops_vanished_and_retyped() {
        let store = enabled_store(vec![driver(
            "bmv",
            &[("v", DataType::BATTERY_VOLTAGE), ("i", DataType::CURRENT), ("soc", DataType::PERCENTAGE)],
        )]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());
        table.bind("battery_voltage", "bmv", "v", &streams).unwrap();
        table.bind("battery_current", "bmv", "i", &streams).unwrap();
        table.bind("battery_soc", "bmv", "soc", &streams).unwrap();

        let updated = driver(
            "bmv",
            &[("v", DataType::BATTERY_VOLTAGE), ("soc", DataType::new("ratio"))],
        );
        let mut removed = table.retain_plugin_streams(&updated);
        removed.sort();
        assert_eq!(removed, vec!["battery_current".to_string(), "battery_soc".to_string()]);
        assert!(table.get("battery_voltage").unwrap().active);
    }

    #[test]
    fn restore_discards_stale_and_deactivates_disabled() {
        let mut store = PluginManifestStore::new();
        store.install(driver("gps", &[("pos", DataType::POSITION)])).unwrap();
        store.install(driver("sounder", &[("d", DataType::DEPTH)])).unwrap();
        store.enable("sounder").unwrap();
        assert_eq!(store.get("gps").unwrap().status, PluginStatus::Installed);

        let records = vec![
            SensorMapping::new("position", "gps", "pos"),
            SensorMapping::new("depth", "sounder", "d"),
            SensorMapping::new("heading", "ghost", "hdg"),
            SensorMapping::new("engine_rpm", "sounder", "d"),
        ];
        let (table, discarded) =
            MappingTable::restore(SlotCatalog::marine(), records, store.list_instances());
        assert_eq!(discarded, 2);
        assert!(!table.get("position").unwrap().active);
        assert!(table.get("depth").unwrap().active);
    }

    #[test]
    fn snapshot_follows_slot_catalog_order() {
        let store = enabled_store(vec![driver(
            "multi",
            &[("rpm", DataType::RPM), ("pos", DataType::POSITION), ("d", DataType::DEPTH)],
        )]);
        let streams = store.stream_catalog();
        let mut table = MappingTable::new(SlotCatalog::marine());
        table.bind("engine_rpm", "multi", "rpm", &streams).unwrap();
        table.bind("depth", "multi", "d", &streams).unwrap();
        table.bind("position", "multi", "pos", &streams).unwrap();

        let order: Vec<String> = table.snapshot().into_iter().map(|m| m.slot_type).collect();
        assert_eq!(order, vec!["position", "depth", "engine_rpm"]);
    }

    #[test]
    fn type_mismatch_for_every_incompatible_pair() {
        let all_types = [
            DataType::SPEED,
            DataType::ANGLE,
            DataType::HEADING,
            DataType::POSITION,
            DataType::WIND_SPEED,
            DataType::WIND_ANGLE,
            DataType::DEPTH,
            DataType::TEMPERATURE,
            DataType::BATTERY_VOLTAGE,
            DataType::CURRENT,
            DataType::PERCENTAGE,
            DataType::RPM,
        ];
        let streams_decl: Vec<(String, DataType)> = all_types
            .iter()
            .map(|dt| (format!("s_{dt}"), dt.clone()))
            .collect();
        let decl: Vec<(&str, DataType)> = streams_decl
            .iter()
            .map(|(id, dt)| (id.as_str(), dt.clone()))
            .collect();
        let store = enabled_store(vec![driver("all", &decl)]);
        let streams = store.stream_catalog();
        let catalog = SlotCatalog::marine();

        for slot in catalog.slots() {
            for stream in streams.available_streams() {
                let mut table = MappingTable::new(catalog.clone());
                let result = table.bind(slot.slot_type, "all", &stream.stream_id, &streams);
                if stream.data_type == slot.expected_data_type {
                    assert!(result.is_ok());
                } else {
                    assert_eq!(result.unwrap_err().kind(), ErrorKind::TypeMismatch);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn at_most_one_active_mapping_and_last_bind_wins(
            binds in proptest::collection::vec((0usize..3, 0usize..4), 1..40)
        ) {
            let store = enabled_store(vec![
                driver("a", &[("v", DataType::BATTERY_VOLTAGE), ("d", DataType::DEPTH)]),
                driver("b", &[("v", DataType::BATTERY_VOLTAGE)]),
                driver("c", &[("v", DataType::BATTERY_VOLTAGE)]),
            ]);
            let streams = store.stream_catalog();
            let targets = [("a", "v"), ("b", "v"), ("c", "v"), ("a", "d")];
            let mut table = MappingTable::new(SlotCatalog::marine());
            let mut last_ok: Option<(&str, &str)> = None;

            for (_, target) in binds {
                let (plugin, stream) = targets[target];
                if table.bind("battery_voltage", plugin, stream, &streams).is_ok() {
                    last_ok = Some((plugin, stream));
                }
                let active = table
                    .snapshot()
                    .into_iter()
                    .filter(|m| m.slot_type == "battery_voltage" && m.active)
                    .count();
                prop_assert!(active <= 1);
                if let Some((plugin, stream)) = last_ok {
                    let current = table.get("battery_voltage").unwrap();
                    prop_assert_eq!(current.plugin_id.as_str(), plugin);
                    prop_assert_eq!(current.stream_id.as_str(), stream);
                }
            }
        }
    }
}
