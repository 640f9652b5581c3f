// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is
//! a no-op.

use bosun_sensors::IngestOutcome;
use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Bosun metric descriptions.
pub fn register_metrics() {
    describe_counter!("bosun_ingest_total", "Sensor values processed by outcome");
    describe_counter!(
        "bosun_ingest_dropped_total",
        "Sensor values dropped because the ingest queue was full"
    );
    describe_counter!("bosun_commands_total", "Engine commands applied by result");
    describe_counter!(
        "bosun_registry_refresh_failures_total",
        "Marketplace registry refreshes that failed"
    );
    describe_gauge!("bosun_active_mappings", "Sensor mappings currently active");
    describe_gauge!("bosun_enabled_plugins", "Plugins currently enabled");
    describe_histogram!(
        "bosun_command_persist_seconds",
        "Time spent persisting one command's changes"
    );
}

/// Record one ingest outcome.
pub fn record_ingest(outcome: &IngestOutcome) {
    let label = match outcome {
        IngestOutcome::Applied(_) => "applied",
        IngestOutcome::Unmapped => "unmapped",
        IngestOutcome::Rejected(_) => "rejected",
    };
    metrics::counter!("bosun_ingest_total", "outcome" => label).increment(1);
}

/// Record an ingest record that failed to decode.
pub fn record_malformed() {
    metrics::counter!("bosun_ingest_total", "outcome" => "malformed").increment(1);
}

/// Record a value evicted from a full ingest queue.
pub fn record_dropped() {
    metrics::counter!("bosun_ingest_dropped_total").increment(1);
}

/// Record an applied or rejected command.
pub fn record_command(command: &'static str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("bosun_commands_total", "command" => command, "result" => result)
        .increment(1);
}

/// Record a failed registry refresh.
pub fn record_refresh_failure() {
    metrics::counter!("bosun_registry_refresh_failures_total").increment(1);
}

/// Set the number of active mappings.
pub fn set_active_mappings(count: usize) {
    metrics::gauge!("bosun_active_mappings").set(count as f64);
}

/// Set the number of enabled plugins.
pub fn set_enabled_plugins(count: usize) {
    metrics::gauge!("bosun_enabled_plugins").set(count as f64);
}

/// Record how long one command took to persist.
pub fn record_persist_latency(seconds: f64) {
    metrics::histogram!("bosun_command_persist_seconds").record(seconds);
}
