// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical sensor slots the dashboard understands.

use bosun_core::DataType;
use serde::Serialize;
use strum::{Display, EnumString};

/// Grouping of slots for display in the data sources tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    Navigation,
    Wind,
    Depth,
    Environment,
    Electrical,
    Engine,
}

/// A canonical sensor role that widgets consume by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotDefinition {
    /// Stable identifier (e.g., "battery_voltage").
    pub slot_type: &'static str,
    pub label: &'static str,
    pub category: SlotCategory,
    pub expected_data_type: DataType,
}

const fn slot(
    slot_type: &'static str,
    label: &'static str,
    category: SlotCategory,
    expected_data_type: DataType,
) -> SlotDefinition {
    SlotDefinition {
        slot_type,
        label,
        category,
        expected_data_type,
    }
}

static MARINE_SLOTS: &[SlotDefinition] = &[
    slot("speed_through_water", "Speed through water", SlotCategory::Navigation, DataType::SPEED),
    slot("speed_over_ground", "Speed over ground", SlotCategory::Navigation, DataType::SPEED),
    slot("course_over_ground", "Course over ground", SlotCategory::Navigation, DataType::ANGLE),
    slot("heading", "Heading", SlotCategory::Navigation, DataType::HEADING),
    slot("position", "Position", SlotCategory::Navigation, DataType::POSITION),
    slot("wind_speed_apparent", "Apparent wind speed", SlotCategory::Wind, DataType::WIND_SPEED),
    slot("wind_angle_apparent", "Apparent wind angle", SlotCategory::Wind, DataType::WIND_ANGLE),
    slot("wind_speed_true", "True wind speed", SlotCategory::Wind, DataType::WIND_SPEED),
    slot("wind_angle_true", "True wind angle", SlotCategory::Wind, DataType::WIND_ANGLE),
    slot("depth", "Depth", SlotCategory::Depth, DataType::DEPTH),
    slot("water_temperature", "Water temperature", SlotCategory::Environment, DataType::TEMPERATURE),
    slot("air_temperature", "Air temperature", SlotCategory::Environment, DataType::TEMPERATURE),
    slot("battery_voltage", "Battery voltage", SlotCategory::Electrical, DataType::BATTERY_VOLTAGE),
    slot("battery_current", "Battery current", SlotCategory::Electrical, DataType::CURRENT),
    slot("battery_soc", "Battery state of charge", SlotCategory::Electrical, DataType::PERCENTAGE),
    slot("engine_rpm", "Engine RPM", SlotCategory::Engine, DataType::RPM),
];

/// Read-only, ordered table of slot definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCatalog {
    slots: Vec<SlotDefinition>,
}

impl SlotCatalog {
    /// The built-in marine slot table.
    pub fn marine() -> Self {
        Self {
            slots: MARINE_SLOTS.to_vec(),
        }
    }

    /// A catalog over an explicit slot table.
    pub fn new(slots: Vec<SlotDefinition>) -> Self {
        Self { slots }
    }

    /// All slots in display order.
    pub fn slots(&self) -> &[SlotDefinition] {
        &self.slots
    }

    /// Slots of one category, in display order. Empty if none match.
    pub fn by_category(&self, category: SlotCategory) -> Vec<&SlotDefinition> {
        self.slots.iter().filter(|s| s.category == category).collect()
    }

    /// Look up a slot by its stable id.
    pub fn get(&self, slot_type: &str) -> Option<&SlotDefinition> {
        self.slots.iter().find(|s| s.slot_type == slot_type)
    }

    /// Display position of a slot, used to order mapping snapshots.
    pub fn position(&self, slot_type: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.slot_type == slot_type)
    }
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::marine()
    }
}
