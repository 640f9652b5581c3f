// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bosun serve` command implementation.
//!
//! Starts the engine on the configured database, feeds newline-delimited
//! JSON sensor values from stdin into it and logs slots that go critically
//! stale. Runs until SIGINT or SIGTERM.

use std::collections::BTreeSet;

use bosun_config::BosunConfig;
use bosun_core::{BosunError, SensorValue, Timestamp};
use bosun_engine::{Engine, MonitorReport};
use bosun_sensors::{Freshness, StaleSeverity};
use chrono::Utc;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands;
use crate::shutdown;

/// One stdin line: `{"plugin_id", "stream_id", "value", "timestamp"?}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestLine {
    pub plugin_id: String,
    pub stream_id: String,
    pub value: SensorValue,
    /// Receive time is used when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Parse a stdin line. Blank lines yield `None`.
pub fn parse_ingest_line(line: &str) -> Result<Option<IngestLine>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Runs the `bosun serve` command.
pub async fn run_serve(config: BosunConfig) -> Result<(), BosunError> {
    let cancel = shutdown::install_signal_handler();
    let engine = commands::open_engine(&config).await?;
    info!(
        database = %config.storage.database_path,
        poll_interval_ms = config.monitor.poll_interval_ms,
        "bosun serving, reading sensor values from stdin"
    );

    let reader = tokio::spawn(read_stdin(engine.clone(), cancel.clone()));
    let mut monitor = engine.subscribe(None);
    let mut critical = CriticalSlots::default();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            report = monitor.recv() => match report {
                Some(report) => critical.observe(&report),
                None => break,
            },
        }
    }

    drop(monitor);
    // A stdin read can block indefinitely.
    reader.abort();
    engine.shutdown().await;
    let stats = engine.stats();
    info!(
        accepted = stats.accepted,
        unmapped = stats.unmapped,
        rejected = stats.rejected,
        dropped = stats.dropped,
        "bosun stopped"
    );
    Ok(())
}

async fn read_stdin(engine: Engine, cancel: CancellationToken) {
    feed_lines(BufReader::new(tokio::io::stdin()), &engine, &cancel).await;
}

/// Feed newline-delimited ingest records into the engine until EOF or
/// cancellation. Returns the number of lines read.
async fn feed_lines<R>(reader: R, engine: &Engine, cancel: &CancellationToken) -> u64
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no: u64 = 0;
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => {
                line_no += 1;
                match parse_ingest_line(&line) {
                    Ok(Some(event)) => engine.ingest(
                        &event.plugin_id,
                        &event.stream_id,
                        event.value,
                        event.timestamp.unwrap_or_else(Utc::now),
                    ),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(line = line_no, error = %e, "ignoring malformed ingest line");
                        engine.reject_malformed();
                    }
                }
            }
            Ok(None) => {
                info!(lines = line_no, "input closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "reading input failed");
                break;
            }
        }
    }
    line_no
}

/// Tracks which slots are critically stale so that only transitions are logged.
#[derive(Debug, Default)]
struct CriticalSlots {
    slots: BTreeSet<String>,
}

impl CriticalSlots {
    fn observe(&mut self, report: &MonitorReport) {
        let now: BTreeSet<String> = report
            .freshness
            .iter()
            .filter(|f| {
                f.freshness
                    == Freshness::Stale {
                        severity: StaleSeverity::Critical,
                    }
            })
            .map(|f| f.slot_type.clone())
            .collect();

        for slot in now.difference(&self.slots) {
            warn!(slot_type = %slot, "sensor slot is critically stale");
        }
        for slot in self.slots.difference(&now) {
            info!(slot_type = %slot, "sensor slot recovered");
        }
        debug!(
            version = report.version,
            mapped = report.freshness.len(),
            critical = now.len(),
            accepted = report.stats.accepted,
            "monitor tick"
        );
        self.slots = now;
    }
}

/// Initialize the tracing subscriber. Logs go to stderr so stdout stays
/// clean for `--json` output.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bosun={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
