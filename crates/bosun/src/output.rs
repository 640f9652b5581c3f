// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal and JSON rendering for CLI commands.

use std::io::IsTerminal;

use bosun_marketplace::RegistryEntry;
use bosun_plugin::{PluginInstance, StreamDescriptor};
use bosun_sensors::{Freshness, SensorMapping, SlotDefinition, SlotFreshness, StaleSeverity};
use colored::Colorize;
use serde::Serialize;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub json: bool,
    pub color: bool,
}

impl Style {
    /// Colors only when not disabled and stdout is a terminal.
    pub fn detect(json: bool, plain: bool) -> Self {
        Self {
            json,
            color: !json && !plain && std::io::stdout().is_terminal(),
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
    );
}

fn header(title: &str) {
    println!();
    println!("  {title}");
    println!("  {}", "-".repeat(50));
}

pub fn print_slots(slots: &[&SlotDefinition], style: Style) {
    if style.json {
        print_json(slots);
        return;
    }
    header("sensor slots");
    for slot in slots {
        println!(
            "    {:<22} {:<12} {:<16} {}",
            slot.slot_type,
            slot.category.to_string(),
            slot.expected_data_type.as_str(),
            slot.label
        );
    }
    println!();
}

pub fn print_instances(instances: &[PluginInstance], style: Style) {
    if style.json {
        print_json(instances);
        return;
    }
    header("installed plugins");
    if instances.is_empty() {
        println!("    (none)");
    }
    for instance in instances {
        let status = instance.status.to_string();
        let status = if style.color {
            match instance.status {
                bosun_core::PluginStatus::Enabled => status.green().to_string(),
                bosun_core::PluginStatus::Error => status.red().to_string(),
                bosun_core::PluginStatus::Loading => status.yellow().to_string(),
                _ => status,
            }
        } else {
            status
        };
        let builtin = if instance.manifest.builtin { " (builtin)" } else { "" };
        println!(
            "    {:<24} {:<10} {:<12} {}{builtin}",
            instance.id(),
            instance.installed_version,
            status,
            instance.manifest.plugin_type
        );
        if let Some(error) = &instance.last_error {
            println!("      last error: {error}");
        }
    }
    println!();
}

pub fn print_instance(action: &str, instance: &PluginInstance, style: Style) {
    if style.json {
        print_json(instance);
        return;
    }
    println!(
        "{action} {} {} ({})",
        instance.id(),
        instance.installed_version,
        instance.status
    );
}

pub fn print_streams(streams: &[StreamDescriptor], style: Style) {
    if style.json {
        print_json(streams);
        return;
    }
    header("available streams");
    if streams.is_empty() {
        println!("    (none; enable a driver plugin)");
    }
    for stream in streams {
        println!(
            "    {:<24} {:<20} {:<16} {}",
            stream.plugin_id,
            stream.stream_id,
            stream.data_type.as_str(),
            stream.stream_name
        );
    }
    println!();
}

/// Table row joining a mapping with its freshness.
#[derive(Debug, Serialize)]
struct MappingRow<'a> {
    #[serde(flatten)]
    mapping: &'a SensorMapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    freshness: Option<&'a SlotFreshness>,
}

pub fn print_mappings(mappings: &[SensorMapping], freshness: &[SlotFreshness], style: Style) {
    let rows: Vec<MappingRow<'_>> = mappings
        .iter()
        .map(|mapping| MappingRow {
            mapping,
            freshness: freshness.iter().find(|f| f.slot_type == mapping.slot_type),
        })
        .collect();
    if style.json {
        print_json(&rows);
        return;
    }
    header("sensor mappings");
    if rows.is_empty() {
        println!("    (none)");
    }
    for row in rows {
        let state = match row.freshness.map(|f| f.freshness) {
            None => "inactive".to_string(),
            Some(state) => freshness_label(state, style.color),
        };
        println!(
            "    {:<22} <- {}/{:<20} {}",
            row.mapping.slot_type, row.mapping.plugin_id, row.mapping.stream_id, state
        );
    }
    println!();
}

fn freshness_label(state: Freshness, color: bool) -> String {
    let label = match state {
        Freshness::Flowing => "flowing",
        Freshness::NoData => "no data",
        Freshness::Stale {
            severity: StaleSeverity::Warning,
        } => "stale",
        Freshness::Stale {
            severity: StaleSeverity::Critical,
        } => "stale (critical)",
    };
    if !color {
        return label.to_string();
    }
    match state {
        Freshness::Flowing => label.green().to_string(),
        Freshness::NoData => label.dimmed().to_string(),
        Freshness::Stale {
            severity: StaleSeverity::Warning,
        } => label.yellow().to_string(),
        Freshness::Stale {
            severity: StaleSeverity::Critical,
        } => label.red().to_string(),
    }
}

pub fn print_mapping(mapping: &SensorMapping, style: Style) {
    if style.json {
        print_json(mapping);
        return;
    }
    println!(
        "bound {} <- {}/{}",
        mapping.slot_type, mapping.plugin_id, mapping.stream_id
    );
}

pub fn print_registry(entries: &[RegistryEntry], style: Style) {
    if style.json {
        print_json(entries);
        return;
    }
    header("marketplace");
    if entries.is_empty() {
        println!("    (no matching plugins)");
    }
    for entry in entries {
        let state = match (entry.is_installed, entry.has_update) {
            (true, true) => "update available",
            (true, false) => "installed",
            (false, _) => "",
        };
        let state = if style.color && entry.has_update {
            state.yellow().to_string()
        } else {
            state.to_string()
        };
        let flag = entry
            .flag
            .as_deref()
            .map(|f| format!(" [{f}]"))
            .unwrap_or_default();
        println!(
            "    {:<24} {:<10} {:<14} {}{flag}",
            entry.id, entry.latest_version, entry.plugin_type, state
        );
    }
    println!();
}
