// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the plugin registry, the mapping table, and the engine.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A raw telemetry value as pushed by a driver.
pub type SensorValue = serde_json::Value;

/// Point in time at which a telemetry value was observed.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifies the kind of values a stream carries and a slot expects.
///
/// Data types are open-ended: drivers may advertise types the dashboard does
/// not know yet. The well-known types are available as associated constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(Cow<'static, str>);

impl DataType {
    pub const SPEED: DataType = DataType::from_static("speed");
    pub const ANGLE: DataType = DataType::from_static("angle");
    pub const HEADING: DataType = DataType::from_static("heading");
    pub const POSITION: DataType = DataType::from_static("position");
    pub const WIND_SPEED: DataType = DataType::from_static("wind_speed");
    pub const WIND_ANGLE: DataType = DataType::from_static("wind_angle");
    pub const DEPTH: DataType = DataType::from_static("depth");
    pub const TEMPERATURE: DataType = DataType::from_static("temperature");
    pub const BATTERY_VOLTAGE: DataType = DataType::from_static("battery_voltage");
    pub const CURRENT: DataType = DataType::from_static("current");
    pub const PERCENTAGE: DataType = DataType::from_static("percentage");
    pub const RPM: DataType = DataType::from_static("rpm");

    /// Data types whose values are a single JSON number.
    const SCALARS: &'static [&'static str] = &[
        "speed",
        "angle",
        "heading",
        "wind_speed",
        "wind_angle",
        "depth",
        "temperature",
        "battery_voltage",
        "current",
        "percentage",
        "rpm",
    ];

    /// Creates a data type from a static identifier.
    pub const fn from_static(id: &'static str) -> Self {
        DataType(Cow::Borrowed(id))
    }

    /// Creates a data type from an owned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        DataType(Cow::Owned(id.into()))
    }

    /// Returns the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that a value has the shape this data type requires.
    ///
    /// `position` needs `{lat, lon}` in degrees, scalar types need a number,
    /// and unknown types accept anything except `null`.
    pub fn accepts(&self, value: &SensorValue) -> bool {
        if self.as_str() == "position" {
            let lat = value.get("lat").and_then(|v| v.as_f64());
            let lon = value.get("lon").and_then(|v| v.as_f64());
            return match (lat, lon) {
                (Some(lat), Some(lon)) => {
                    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
                }
                _ => false,
            };
        }
        if Self::SCALARS.contains(&self.as_str()) {
            return value.is_number();
        }
        !value.is_null()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataType {
    fn from(id: &str) -> Self {
        DataType::new(id)
    }
}

/// The role a plugin plays in the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PluginType {
    /// Produces live data streams.
    Driver,
    UiExtension,
    Service,
    Integration,
}

/// Runtime status of an installed plugin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    /// Installed but never enabled.
    Installed,
    /// Active; its streams are available for mapping.
    Enabled,
    /// Explicitly disabled by the user.
    Disabled,
    /// An update is being fetched.
    Loading,
    /// The driver reported a runtime fault.
    Error,
}

impl PluginStatus {
    /// Whether a plugin in this status publishes its streams.
    pub fn publishes_streams(self) -> bool {
        self == PluginStatus::Enabled
    }

    /// Whether active mappings of a plugin in this status stay active.
    ///
    /// Only the user deactivates mappings; a runtime fault or an in-flight
    /// update leaves them in place.
    pub fn retains_mappings(self) -> bool {
        matches!(
            self,
            PluginStatus::Enabled | PluginStatus::Error | PluginStatus::Loading
        )
    }
}
