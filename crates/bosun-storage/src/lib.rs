// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Bosun.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer connection
//! via `tokio-rusqlite`. Stores installed plugin instances and sensor
//! mappings; each engine command is persisted in one transaction.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod writer;

pub use database::Database;
pub use models::{Change, PersistedState};
pub use writer::{apply, load};
