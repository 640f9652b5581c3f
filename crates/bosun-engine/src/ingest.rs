// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded drop-oldest queue between producers and the writer task.
//!
//! Producers never wait: when the queue is full the oldest pending value is
//! discarded and counted. The writer is woken through a [`Notify`].

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use bosun_core::{SensorValue, Timestamp};
use serde::Serialize;
use tokio::sync::Notify;

/// One value pushed by a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestEvent {
    pub plugin_id: String,
    pub stream_id: String,
    pub value: SensorValue,
    pub timestamp: Timestamp,
}

/// Running ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub accepted: u64,
    pub unmapped: u64,
    pub rejected: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
pub(crate) struct IngestCounters {
    pub accepted: AtomicU64,
    pub unmapped: AtomicU64,
    pub rejected: AtomicU64,
    pub dropped: AtomicU64,
}

impl IngestCounters {
    pub fn snapshot(&self) -> IngestStats {
        IngestStats {
            accepted: self.accepted.load(Ordering::Acquire),
            unmapped: self.unmapped.load(Ordering::Acquire),
            rejected: self.rejected.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Acquire),
        }
    }
}

#[derive(Debug)]
pub(crate) struct IngestQueue {
    events: Mutex<VecDeque<IngestEvent>>,
    capacity: usize,
    notify: Notify,
}

impl IngestQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
        }
    }

    /// Enqueue an event. Returns `true` when an older event was evicted.
    pub fn push(&self, event: IngestEvent) -> bool {
        let evicted = {
            let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
            let evicted = if events.len() >= self.capacity {
                events.pop_front().is_some()
            } else {
                false
            };
            events.push_back(event);
            evicted
        };
        self.notify.notify_one();
        evicted
    }

    /// Take every pending event in arrival order.
    pub fn drain(&self) -> Vec<IngestEvent> {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.drain(..).collect()
    }

    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
