// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic monitor reports for polling consumers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

use crate::engine::Shared;
use crate::snapshot::MonitorReport;

/// Number of debug tap entries included in each report.
pub const REPORT_TAP_ENTRIES: usize = 20;

/// Receives a [`MonitorReport`] every interval.
///
/// Dropping the handle stops its timer task.
pub struct Subscription {
    reports: mpsc::Receiver<MonitorReport>,
    _guard: DropGuard,
}

impl Subscription {
    pub(crate) fn spawn(shared: Arc<Shared>, interval: Duration) -> Self {
        let (tx, reports) = mpsc::channel(1);
        let token = CancellationToken::new();
        let cancel = token.clone();
        let interval = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let report = shared.monitor_report(REPORT_TAP_ENTRIES, Utc::now());
                        // A slow subscriber skips ticks instead of queueing them.
                        match tx.try_send(report) {
                            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                            Err(mpsc::error::TrySendError::Closed(_)) => break,
                        }
                    }
                }
            }
            debug!("monitor subscription ended");
        });

        Self {
            reports,
            _guard: token.drop_guard(),
        }
    }

    /// Wait for the next report. `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<MonitorReport> {
        self.reports.recv().await
    }
}
