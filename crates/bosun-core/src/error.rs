// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Bosun sensor-mapping engine.

use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

/// The primary error type returned by every write-path operation of the engine.
///
/// Each variant maps to exactly one stable [`ErrorKind`] so that callers can
/// render an actionable message without string matching.
#[derive(Debug, Error)]
pub enum BosunError {
    /// The manifest is malformed or missing required fields.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// A plugin with the same id is already installed.
    #[error("plugin `{plugin_id}` is already installed")]
    DuplicatePlugin { plugin_id: String },

    /// No installed plugin has this id.
    #[error("plugin `{plugin_id}` not found")]
    PluginNotFound { plugin_id: String },

    /// The slot type is not part of the slot catalog.
    #[error("sensor slot `{slot_type}` not found")]
    SlotNotFound { slot_type: String },

    /// The stream does not exist or its plugin is not enabled.
    #[error("stream `{plugin_id}/{stream_id}` not found or not enabled")]
    StreamNotFound { plugin_id: String, stream_id: String },

    /// Built-in plugins cannot be uninstalled.
    #[error("plugin `{plugin_id}` is built in and cannot be uninstalled")]
    Protected { plugin_id: String },

    /// The stream's data type differs from the slot's expected data type.
    #[error("slot `{slot_type}` expects `{expected}` but stream provides `{actual}`")]
    TypeMismatch {
        slot_type: String,
        expected: String,
        actual: String,
    },

    /// The remote plugin registry could not be reached or returned garbage.
    #[error("plugin registry unreachable: {message}")]
    RegistryUnreachable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Fetching or verifying a plugin package failed.
    #[error("install of `{plugin_id}` failed: {message}")]
    InstallFailed { plugin_id: String, message: String },

    /// A newer registry refresh started before this one finished.
    #[error("registry refresh superseded by a newer request")]
    RefreshSuperseded,

    /// Configuration errors (invalid TOML, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Stable classification of [`BosunError`] variants.
///
/// The string forms are part of the public contract and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidManifest,
    DuplicatePlugin,
    NotFound,
    Protected,
    TypeMismatch,
    RegistryUnreachable,
    InstallFailed,
    RefreshSuperseded,
    Config,
    Storage,
    Internal,
}

impl BosunError {
    /// Returns the stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BosunError::InvalidManifest(_) => ErrorKind::InvalidManifest,
            BosunError::DuplicatePlugin { .. } => ErrorKind::DuplicatePlugin,
            BosunError::PluginNotFound { .. }
            | BosunError::SlotNotFound { .. }
            | BosunError::StreamNotFound { .. } => ErrorKind::NotFound,
            BosunError::Protected { .. } => ErrorKind::Protected,
            BosunError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            BosunError::RegistryUnreachable { .. } => ErrorKind::RegistryUnreachable,
            BosunError::InstallFailed { .. } => ErrorKind::InstallFailed,
            BosunError::RefreshSuperseded => ErrorKind::RefreshSuperseded,
            BosunError::Config(_) => ErrorKind::Config,
            BosunError::Storage { .. } => ErrorKind::Storage,
            BosunError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a [`BosunError::PluginNotFound`].
    pub fn plugin_not_found(plugin_id: impl Into<String>) -> Self {
        BosunError::PluginNotFound {
            plugin_id: plugin_id.into(),
        }
    }

    /// Shorthand for a [`BosunError::StreamNotFound`].
    pub fn stream_not_found(plugin_id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        BosunError::StreamNotFound {
            plugin_id: plugin_id.into(),
            stream_id: stream_id.into(),
        }
    }

    /// Shorthand for a [`BosunError::InstallFailed`].
    pub fn install_failed(plugin_id: impl Into<String>, message: impl Into<String>) -> Self {
        BosunError::InstallFailed {
            plugin_id: plugin_id.into(),
            message: message.into(),
        }
    }
}
