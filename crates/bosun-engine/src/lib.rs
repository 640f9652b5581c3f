// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bosun engine: the single writer over plugin registry and sensor mappings.
//!
//! [`Engine`] is a cloneable handle. Mutations are linearized through a
//! bounded command mailbox and persisted before they become visible; sensor
//! values flow through a non-blocking ingest queue; readers get lock-free
//! [`EngineSnapshot`]s and can subscribe to periodic [`MonitorReport`]s.

pub mod engine;
pub mod ingest;
pub mod metrics;
pub mod snapshot;
pub mod state;
pub mod subscription;

pub use engine::Engine;
pub use ingest::{IngestEvent, IngestStats};
pub use snapshot::{EngineSnapshot, MonitorReport};
pub use subscription::Subscription;
