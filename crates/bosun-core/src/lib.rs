// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Bosun sensor-mapping engine.
//!
//! This crate provides the error taxonomy and the value types shared by the
//! plugin registry, the mapping table, the marketplace client, and storage.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BosunError, ErrorKind};
pub use types::{DataType, PluginStatus, PluginType, SensorValue, Timestamp};
