// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive capacities and well-formed URLs.

use crate::diagnostic::ConfigError;
use crate::model::BosunConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BosunConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.engine.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.log_level `{}` is not one of {}",
                config.engine.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.engine.command_buffer == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.command_buffer must be at least 1".to_string(),
        });
    }

    if config.engine.ingest_queue_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.ingest_queue_capacity must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if let Some(url) = &config.marketplace.registry_url {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::Validation {
                message: format!("marketplace.registry_url `{url}` must be an http(s) URL"),
            });
        }
    }

    if config.marketplace.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "marketplace.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if let Some(dir) = &config.marketplace.payload_dir {
        if dir.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "marketplace.payload_dir must not be empty when set".to_string(),
            });
        }
    }

    if config.monitor.poll_interval_ms < 100 {
        errors.push(ConfigError::Validation {
            message: format!(
                "monitor.poll_interval_ms must be at least 100, got {}",
                config.monitor.poll_interval_ms
            ),
        });
    }

    if config.monitor.debug_tap_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "monitor.debug_tap_capacity must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
