// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded ring buffer of recent ingest events for troubleshooting.

use std::collections::VecDeque;

use bosun_core::{SensorValue, Timestamp};
use serde::Serialize;

use crate::mapping::IngestOutcome;

/// One value seen by the ingest path, whatever happened to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapEntry {
    pub plugin_id: String,
    pub stream_id: String,
    pub value: SensorValue,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

/// Keeps the most recent `capacity` ingest events, dropping the oldest.
#[derive(Debug, Clone)]
pub struct DebugTap {
    entries: VecDeque<TapEntry>,
    capacity: usize,
}

impl DebugTap {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, entry: TapEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The last `limit` entries in arrival order.
    pub fn recent(&self, limit: usize) -> Vec<TapEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Number of entries currently retained.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before the first event is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
