// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Bosun integration tests.
//!
//! Provides manifest fixtures, an in-memory registry and a harness that
//! starts a full engine on a temporary database.
//!
//! # Components
//!
//! - [`fixtures`] - Manifest, listing and package builders
//! - [`MockRegistry`] - Scriptable [`RegistrySource`](bosun_marketplace::RegistrySource)
//! - [`TestHarness`] - Engine on a temp SQLite file with a mock registry

pub mod fixtures;
pub mod harness;
pub mod mock_registry;

pub use harness::TestHarness;
pub use mock_registry::MockRegistry;
