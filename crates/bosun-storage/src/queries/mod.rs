// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed row operations for each table.

pub mod mappings;
pub mod plugins;

/// Wrap a decode failure of a text column as a rusqlite conversion error.
pub(crate) fn decode_err(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}
