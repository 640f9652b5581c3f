// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sensor slots and the slot-to-stream mapping layer.
//!
//! Widgets read canonical slots ("depth", "battery_voltage") rather than
//! driver streams. The [`MappingTable`] routes live values from streams to
//! slots, [`freshness`] classifies how current each slot is, and the
//! [`DebugTap`] keeps a short history of raw ingest events.

pub mod debug_tap;
pub mod freshness;
pub mod mapping;
pub mod slots;

pub use debug_tap::{DebugTap, TapEntry};
pub use freshness::{Freshness, SlotFreshness, StaleSeverity};
pub use mapping::{IngestOutcome, MappingTable, RejectReason, SensorMapping};
pub use slots::{SlotCatalog, SlotCategory, SlotDefinition};
