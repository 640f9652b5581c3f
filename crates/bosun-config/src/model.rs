// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Bosun engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Bosun configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BosunConfig {
    /// Engine actor and logging settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Plugin marketplace settings.
    #[serde(default)]
    pub marketplace: MarketplaceConfig,

    /// Freshness monitor and debug tap settings.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Plugin bootstrap settings.
    #[serde(default)]
    pub plugins: PluginsConfig,
}

/// Engine actor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of the command mailbox. Senders wait when it is full.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Capacity of the ingest queue. The oldest event is dropped when full.
    #[serde(default = "default_ingest_queue_capacity")]
    pub ingest_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            command_buffer: default_command_buffer(),
            ingest_queue_capacity: default_ingest_queue_capacity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_command_buffer() -> usize {
    64
}

fn default_ingest_queue_capacity() -> usize {
    1024
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("bosun").join("bosun.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("bosun.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Plugin marketplace configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MarketplaceConfig {
    /// Base URL of the plugin registry. `None` disables the marketplace.
    #[serde(default)]
    pub registry_url: Option<String>,

    /// Timeout for a single registry request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory where downloaded plugin payloads are stored.
    /// `None` keeps payloads in memory only.
    #[serde(default)]
    pub payload_dir: Option<String>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            registry_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            payload_dir: None,
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// Freshness monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Default interval between monitor reports.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Number of raw ingest events kept in the debug tap.
    #[serde(default = "default_debug_tap_capacity")]
    pub debug_tap_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            debug_tap_capacity: default_debug_tap_capacity(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_debug_tap_capacity() -> usize {
    200
}

/// Plugin bootstrap configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Install the bundled built-in plugins on first start.
    #[serde(default = "default_seed_builtins")]
    pub seed_builtins: bool,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            seed_builtins: default_seed_builtins(),
        }
    }
}

fn default_seed_builtins() -> bool {
    true
}
