// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry and mapping state owned by the writer task.
//!
//! [`EngineState::apply`] runs one command against the state and is only
//! ever called on a scratch copy: the writer persists the resulting
//! [`Change`]s and adopts the copy only if that succeeds.

use std::collections::HashMap;

use bosun_core::{BosunError, PluginStatus};
use bosun_plugin::{PluginInstance, PluginManifest, PluginManifestStore, StreamCatalog};
use bosun_sensors::{MappingTable, SensorMapping, SlotCatalog};
use bosun_storage::{Change, PersistedState};
use strum::IntoStaticStr;
use tracing::{info, warn};

/// A state mutation, as carried by the command mailbox.
#[derive(Debug, Clone, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Op {
    Install(PluginManifest),
    Uninstall(String),
    Enable(String),
    Disable(String),
    Bind {
        slot_type: String,
        plugin_id: String,
        stream_id: String,
    },
    Unbind {
        slot_type: String,
        plugin_id: String,
        stream_id: String,
    },
    AutoMap(String),
    ReportError {
        plugin_id: String,
        message: String,
    },
    /// Mark a plugin `loading` while its update is fetched.
    BeginUpdate(String),
    /// End an update. `None` restores the previous status without changes.
    FinishUpdate {
        plugin_id: String,
        previous: PluginStatus,
        manifest: Option<PluginManifest>,
    },
}

/// What a successful [`Op`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Instance(PluginInstance),
    Mapping(SensorMapping),
    Unbound(bool),
    Mapped(Vec<SensorMapping>),
    Status(PluginStatus),
}

/// Plugin store, mapping table and the derived stream catalog.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub store: PluginManifestStore,
    pub mappings: MappingTable,
    pub streams: StreamCatalog,
}

impl EngineState {
    pub fn new(slots: SlotCatalog) -> Self {
        Self {
            store: PluginManifestStore::new(),
            mappings: MappingTable::new(slots),
            streams: StreamCatalog::default(),
        }
    }

    /// Rebuild state from storage and re-establish the mapping invariants.
    ///
    /// Returns the state and the changes needed to bring storage in line:
    /// mappings to unknown plugins are deleted, mappings of plugins that are
    /// not enabled are stored inactive.
    pub fn restore(slots: SlotCatalog, persisted: PersistedState) -> (Self, Vec<Change>) {
        let store = PluginManifestStore::from_instances(persisted.plugins);
        let (mappings, discarded) =
            MappingTable::restore(slots, persisted.mappings.clone(), store.list_instances());
        if discarded > 0 {
            warn!(discarded, "discarded persisted mappings that no longer match a plugin stream");
        }

        let mut fixes = Vec::new();
        for record in &persisted.mappings {
            match mappings.get(&record.slot_type) {
                None => fixes.push(Change::DeleteMapping(record.slot_type.clone())),
                Some(current) if current.active != record.active => {
                    fixes.push(Change::UpsertMapping(current.clone()))
                }
                Some(_) => {}
            }
        }

        let streams = store.stream_catalog();
        info!(
            plugins = store.len(),
            mappings = mappings.len(),
            streams = streams.len(),
            "engine state restored"
        );
        (
            Self {
                store,
                mappings,
                streams,
            },
            fixes,
        )
    }

    /// Apply one operation and return its outcome with the changes to persist.
    pub fn apply(&mut self, op: Op) -> Result<(Outcome, Vec<Change>), BosunError> {
        let before = self.clone();
        let outcome = self.apply_op(op)?;
        self.streams = self.store.stream_catalog();
        Ok((outcome, diff(&before, self)))
    }

    fn apply_op(&mut self, op: Op) -> Result<Outcome, BosunError> {
        match op {
            Op::Install(manifest) => {
                let instance = self.store.install(manifest)?;
                info!(plugin_id = %instance.id(), version = %instance.installed_version, "plugin installed");
                Ok(Outcome::Instance(instance))
            }
            Op::Uninstall(plugin_id) => {
                let instance = self.store.uninstall(&plugin_id)?;
                let removed = self.mappings.remove_plugin(&plugin_id);
                info!(plugin_id = %plugin_id, removed_mappings = removed.len(), "plugin uninstalled");
                Ok(Outcome::Instance(instance))
            }
            Op::Enable(plugin_id) => {
                self.store.enable(&plugin_id)?;
                info!(plugin_id = %plugin_id, "plugin enabled");
                self.instance(&plugin_id)
            }
            Op::Disable(plugin_id) => {
                self.store.disable(&plugin_id)?;
                let deactivated = self.mappings.deactivate_plugin(&plugin_id);
                info!(plugin_id = %plugin_id, deactivated, "plugin disabled");
                self.instance(&plugin_id)
            }
            Op::Bind {
                slot_type,
                plugin_id,
                stream_id,
            } => {
                self.mappings
                    .bind(&slot_type, &plugin_id, &stream_id, &self.streams)?;
                self.mappings
                    .get(&slot_type)
                    .cloned()
                    .map(Outcome::Mapping)
                    .ok_or_else(|| BosunError::Internal(format!("binding of `{slot_type}` vanished")))
            }
            Op::Unbind {
                slot_type,
                plugin_id,
                stream_id,
            } => Ok(Outcome::Unbound(
                self.mappings.unbind(&slot_type, &plugin_id, &stream_id),
            )),
            Op::AutoMap(plugin_id) => {
                if self.store.get(&plugin_id).is_none() {
                    return Err(BosunError::plugin_not_found(plugin_id));
                }
                Ok(Outcome::Mapped(
                    self.mappings.auto_map(&plugin_id, &self.streams),
                ))
            }
            Op::ReportError { plugin_id, message } => {
                self.store.report_error(&plugin_id, &message)?;
                warn!(plugin_id = %plugin_id, error = %message, "plugin reported a runtime fault");
                self.instance(&plugin_id)
            }
            Op::BeginUpdate(plugin_id) => {
                let previous = self.store.set_loading(&plugin_id)?;
                Ok(Outcome::Status(previous))
            }
            Op::FinishUpdate {
                plugin_id,
                previous,
                manifest,
            } => {
                if let Some(manifest) = manifest {
                    if manifest.id != plugin_id {
                        return Err(BosunError::install_failed(
                            &plugin_id,
                            format!("update carries manifest of `{}`", manifest.id),
                        ));
                    }
                    let old = self.store.replace_manifest(manifest.clone())?;
                    let dropped = self.mappings.retain_plugin_streams(&manifest);
                    info!(
                        plugin_id = %plugin_id,
                        from = %old.version,
                        to = %manifest.version,
                        dropped_mappings = dropped.len(),
                        "plugin updated"
                    );
                }
                self.store.finish_loading(&plugin_id, previous)?;
                self.instance(&plugin_id)
            }
        }
    }

    fn instance(&self, plugin_id: &str) -> Result<Outcome, BosunError> {
        self.store
            .get(plugin_id)
            .cloned()
            .map(Outcome::Instance)
            .ok_or_else(|| BosunError::plugin_not_found(plugin_id))
    }
}

/// Row-level changes between two states.
///
/// Mappings are compared by binding and active flag; cached values are not
/// persisted. Instances in `loading` are transient and not written.
pub fn diff(before: &EngineState, after: &EngineState) -> Vec<Change> {
    let mut changes = Vec::new();

    let old_plugins: HashMap<&str, &PluginInstance> = before
        .store
        .list_instances()
        .iter()
        .map(|i| (i.id(), i))
        .collect();
    for instance in after.store.list_instances() {
        if instance.status == PluginStatus::Loading {
            continue;
        }
        if old_plugins.get(instance.id()) != Some(&instance) {
            changes.push(Change::UpsertPlugin(instance.clone()));
        }
    }
    for id in old_plugins.keys() {
        if after.store.get(id).is_none() {
            changes.push(Change::DeletePlugin(id.to_string()));
        }
    }

    let old_mappings = before.mappings.snapshot();
    let new_mappings = after.mappings.snapshot();
    for mapping in &new_mappings {
        let unchanged = old_mappings.iter().any(|m| {
            m.slot_type == mapping.slot_type
                && m.plugin_id == mapping.plugin_id
                && m.stream_id == mapping.stream_id
                && m.active == mapping.active
        });
        if !unchanged {
            changes.push(Change::UpsertMapping(mapping.clone()));
        }
    }
    for mapping in &old_mappings {
        if after.mappings.get(&mapping.slot_type).is_none() {
            changes.push(Change::DeleteMapping(mapping.slot_type.clone()));
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use bosun_core::{DataType, ErrorKind, PluginType};
    use bosun_plugin::{DriverSection, StreamSpec};

    fn driver(id: &str, version: &str, streams: &[(&str, DataType)]) -> PluginManifest {
        PluginManifest {
            id: id.to_string(),
            name: id.to_string(),
            version: version.to_string(),
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

    fn bind(slot: &str, plugin: &str, stream: &str) -> Op {
        Op::Bind {
            slot_type: slot.to_string(),
            plugin_id: plugin.to_string(),
            stream_id: stream.to_string(),
        }
    }

    fn state_with_enabled(manifest: PluginManifest) -> EngineState {
        let mut state = EngineState::new(SlotCatalog::marine());
        let id = manifest.id.clone();
        state.apply(Op::Install(manifest)).unwrap();
        state.apply(Op::Enable(id)).unwrap();
        state
    }

    #[test]
    fn install_persists_the_new_instance() {
        let mut state = EngineState::new(SlotCatalog::marine());
        let (outcome, changes) = state
            .apply(Op::Install(driver("sounder", "1.0.0", &[("d", DataType::DEPTH)])))
            .unwrap();
        assert!(matches!(outcome, Outcome::Instance(ref i) if i.status == PluginStatus::Installed));
        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0], Change::UpsertPlugin(_)));
        assert!(state.streams.is_empty());
    }

    #[test]
    #[tracing_test::traced_test]
    fn lifecycle_changes_are_logged() {
        let mut state = EngineState::new(SlotCatalog::marine());
        state
            .apply(Op::Install(driver("sounder", "1.0.0", &[("d", DataType::DEPTH)])))
            .unwrap();
        state.apply(Op::Enable("sounder".to_string())).unwrap();
        assert!(logs_contain("plugin installed"));
        assert!(logs_contain("plugin enabled"));
    }

    #[test]
    fn enable_publishes_streams() {
        let state = state_with_enabled(driver("sounder", "1.0.0", &[("d", DataType::DEPTH)]));
        assert!(state.streams.find("sounder", "d").is_some());
    }

    #[test]
    fn disable_deactivates_and_persists_mappings() {
        let mut state = state_with_enabled(driver("sounder", "1.0.0", &[("d", DataType::DEPTH)]));
        state.apply(bind("depth", "sounder", "d")).unwrap();

        let (_, changes) = state.apply(Op::Disable("sounder".to_string())).unwrap();
        assert!(state.streams.is_empty());
        assert!(!state.mappings.get("depth").unwrap().active);
        assert!(changes
            .iter()
            .any(|c| matches!(c, Change::UpsertMapping(m) if !m.active)));
    }

    #[test]
    fn uninstall_deletes_plugin_and_mappings() {
        let mut state = state_with_enabled(driver("sounder", "1.0.0", &[("d", DataType::DEPTH)]));
        state.apply(bind("depth", "sounder", "d")).unwrap();

        let (_, changes) = state.apply(Op::Uninstall("sounder".to_string())).unwrap();
        assert!(state.mappings.is_empty());
        assert!(changes.contains(&Change::DeletePlugin("sounder".to_string())));
        assert!(changes.contains(&Change::DeleteMapping("depth".to_string())));

        // Re-install starts from scratch with no mappings.
        state
            .apply(Op::Install(driver("sounder", "1.0.0", &[("d", DataType::DEPTH)])))
            .unwrap();
        assert!(state.mappings.is_empty());
        assert_eq!(state.store.get("sounder").unwrap().status, PluginStatus::Installed);
    }

    #[test]
    fn failed_op_reports_typed_error() {
        let mut state = EngineState::new(SlotCatalog::marine());
        let err = state.apply(Op::AutoMap("ghost".to_string())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = state.apply(bind("depth", "ghost", "d")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn loading_status_is_not_persisted() {
        let mut state = state_with_enabled(driver("sounder", "1.0.0", &[("d", DataType::DEPTH)]));
        let (outcome, changes) = state.apply(Op::BeginUpdate("sounder".to_string())).unwrap();
        assert_eq!(outcome, Outcome::Status(PluginStatus::Enabled));
        assert!(changes.is_empty());
        assert!(state.streams.is_empty());
    }

    #[test]
    fn update_keeps_surviving_mappings_and_restores_status() {
        let mut state = state_with_enabled(driver(
            "bmv",
            "1.0.0",
            &[("v", DataType::BATTERY_VOLTAGE), ("i", DataType::CURRENT)],
        ));
        state.apply(bind("battery_voltage", "bmv", "v")).unwrap();
        state.apply(bind("battery_current", "bmv", "i")).unwrap();

        state.apply(Op::BeginUpdate("bmv".to_string())).unwrap();
        let (outcome, changes) = state
            .apply(Op::FinishUpdate {
                plugin_id: "bmv".to_string(),
                previous: PluginStatus::Enabled,
                manifest: Some(driver("bmv", "1.1.0", &[("v", DataType::BATTERY_VOLTAGE)])),
            })
            .unwrap();

        let Outcome::Instance(instance) = outcome else {
            panic!("expected instance outcome");
        };
        assert_eq!(instance.installed_version, "1.1.0");
        assert_eq!(instance.status, PluginStatus::Enabled);
        assert!(state.mappings.get("battery_voltage").unwrap().active);
        assert!(state.mappings.get("battery_current").is_none());
        assert!(changes.contains(&Change::DeleteMapping("battery_current".to_string())));
    }

    #[test]
    fn restore_fixes_stale_records() {
        let mut instance_state =
            state_with_enabled(driver("sounder", "1.0.0", &[("d", DataType::DEPTH)]));
        instance_state
            .apply(Op::Disable("sounder".to_string()))
            .unwrap();
        let persisted = PersistedState {
            plugins: instance_state.store.list_instances().to_vec(),
            mappings: vec![
                SensorMapping {
                    slot_type: "depth".to_string(),
                    plugin_id: "sounder".to_string(),
                    stream_id: "d".to_string(),
                    active: true,
                    last_update: None,
                    last_value: None,
                },
                SensorMapping {
                    slot_type: "heading".to_string(),
                    plugin_id: "ghost".to_string(),
                    stream_id: "hdg".to_string(),
                    active: true,
                    last_update: None,
                    last_value: None,
                },
            ],
        };

        let (state, fixes) = EngineState::restore(SlotCatalog::marine(), persisted);
        assert!(!state.mappings.get("depth").unwrap().active);
        assert!(state.streams.is_empty());
        assert_eq!(fixes.len(), 2);
        assert!(fixes.contains(&Change::DeleteMapping("heading".to_string())));
    }

    #[test]
    fn faulted_plugin_keeps_mappings_across_restore() {
        let mut live = state_with_enabled(driver("gps", "1.0.0", &[("pos", DataType::POSITION)]));
        live.apply(bind("position", "gps", "pos")).unwrap();
        live.apply(Op::ReportError {
            plugin_id: "gps".to_string(),
            message: "serial port closed".to_string(),
        })
        .unwrap();
        assert!(live.mappings.get("position").unwrap().active);

        let persisted = PersistedState {
            plugins: live.store.list_instances().to_vec(),
            mappings: live.mappings.snapshot(),
        };
        let (mut restarted, fixes) = EngineState::restore(SlotCatalog::marine(), persisted);
        assert!(fixes.is_empty(), "unexpected repairs: {fixes:?}");
        assert!(restarted.mappings.get("position").unwrap().active);

        live.apply(Op::Enable("gps".to_string())).unwrap();
        restarted.apply(Op::Enable("gps".to_string())).unwrap();
        assert_eq!(
            live.mappings.get("position").unwrap().active,
            restarted.mappings.get("position").unwrap().active
        );
        assert!(restarted.mappings.get("position").unwrap().active);
    }
}
