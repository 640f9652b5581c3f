// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data freshness classification for mapped slots.

use bosun_core::Timestamp;
use chrono::TimeDelta;
use serde::Serialize;
use strum::Display;

use crate::mapping::SensorMapping;

/// Age at which a value stops counting as flowing.
pub const STALE_AFTER_MS: i64 = 3_000;

/// Age at which a stale value becomes critical.
pub const CRITICAL_AFTER_MS: i64 = 10_000;

/// How stale a slot's last value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StaleSeverity {
    Warning,
    Critical,
}

/// Freshness of one active mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Freshness {
    Flowing,
    Stale { severity: StaleSeverity },
    /// Mapped, but no value has arrived yet.
    NoData,
}

/// Freshness of one slot at the time of a monitor tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotFreshness {
    pub slot_type: String,
    pub plugin_id: String,
    pub stream_id: String,
    pub freshness: Freshness,
    /// Age of the last value in milliseconds, absent without data.
    pub age_ms: Option<i64>,
}

/// Classify a mapping relative to `now`.
///
/// A timestamp in the future counts as age zero.
pub fn classify(mapping: &SensorMapping, now: Timestamp) -> Freshness {
    match mapping.last_update {
        None => Freshness::NoData,
        Some(last) => classify_age(age(last, now)),
    }
}

fn age(last: Timestamp, now: Timestamp) -> TimeDelta {
    (now - last).max(TimeDelta::zero())
}

fn classify_age(age: TimeDelta) -> Freshness {
    let ms = age.num_milliseconds();
    if ms < STALE_AFTER_MS {
        Freshness::Flowing
    } else if ms < CRITICAL_AFTER_MS {
        Freshness::Stale {
            severity: StaleSeverity::Warning,
        }
    } else {
        Freshness::Stale {
            severity: StaleSeverity::Critical,
        }
    }
}

/// Freshness of every active mapping, in the order given.
pub fn report(mappings: &[SensorMapping], now: Timestamp) -> Vec<SlotFreshness> {
    mappings
        .iter()
        .filter(|m| m.active)
        .map(|m| SlotFreshness {
            slot_type: m.slot_type.clone(),
            plugin_id: m.plugin_id.clone(),
            stream_id: m.stream_id.clone(),
            freshness: classify(m, now),
            age_ms: m.last_update.map(|last| age(last, now).num_milliseconds()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn mapping(last_update: Option<Timestamp>) -> SensorMapping {
        SensorMapping {
            slot_type: "depth".to_string(),
            plugin_id: "sounder".to_string(),
            stream_id: "d".to_string(),
            active: true,
            last_update,
            last_value: last_update.map(|_| serde_json::json!(3.2)),
        }
    }

    fn base() -> Timestamp {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn at(ms: i64) -> Timestamp {
        base() + TimeDelta::milliseconds(ms)
    }

    #[test]
    fn thresholds() {
        let m = mapping(Some(base()));
        assert_eq!(classify(&m, at(2_999)), Freshness::Flowing);
        assert_eq!(
            classify(&m, at(3_001)),
            Freshness::Stale {
                severity: StaleSeverity::Warning
            }
        );
        assert_eq!(
            classify(&m, at(9_999)),
            Freshness::Stale {
                severity: StaleSeverity::Warning
            }
        );
        assert_eq!(
            classify(&m, at(10_001)),
            Freshness::Stale {
                severity: StaleSeverity::Critical
            }
        );
    }

    #[test]
    fn no_data_until_first_value() {
        assert_eq!(classify(&mapping(None), at(50_000)), Freshness::NoData);
    }

    #[test]
    fn future_timestamps_count_as_fresh() {
        let m = mapping(Some(at(5_000)));
        assert_eq!(classify(&m, base()), Freshness::Flowing);
    }

    #[test]
    fn report_skips_inactive_mappings() {
        let mut inactive = mapping(Some(base()));
        inactive.slot_type = "heading".to_string();
        inactive.active = false;
        let rows = report(&[mapping(Some(base())), inactive], at(4_000));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].slot_type, "depth");
        assert_eq!(rows[0].age_ms, Some(4_000));
    }

    #[test]
    fn freshness_serializes_with_state_tag() {
        let json = serde_json::to_value(Freshness::Stale {
            severity: StaleSeverity::Critical,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"state": "stale", "severity": "critical"}));
        let json = serde_json::to_value(Freshness::NoData).unwrap();
        assert_eq!(json, serde_json::json!({"state": "no_data"}));
    }
}
