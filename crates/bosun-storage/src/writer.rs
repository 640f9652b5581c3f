// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transactional apply of a command's changes.
//!
//! The engine persists each command's full change set through [`apply`]
//! before publishing the new state. Either every change lands or none does.

use bosun_core::BosunError;
use tracing::debug;

use crate::database::Database;
use crate::models::{Change, PersistedState};
use crate::queries::{mappings, plugins};

/// Apply all changes in a single transaction.
pub async fn apply(db: &Database, changes: Vec<Change>) -> Result<(), BosunError> {
    if changes.is_empty() {
        return Ok(());
    }
    let count = changes.len();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for change in &changes {
                match change {
                    Change::UpsertPlugin(instance) => plugins::upsert(&tx, instance)?,
                    Change::DeletePlugin(plugin_id) => plugins::delete(&tx, plugin_id)?,
                    Change::UpsertMapping(mapping) => mappings::upsert(&tx, mapping)?,
                    Change::DeleteMapping(slot_type) => mappings::delete(&tx, slot_type)?,
                }
            }
            tx.commit()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    debug!(count, "changes persisted");
    Ok(())
}

/// Load plugins and mappings in one read transaction.
pub async fn load(db: &Database) -> Result<PersistedState, BosunError> {
    db.connection()
        .call(|conn| {
            let tx = conn.transaction()?;
            let state = PersistedState {
                plugins: plugins::load_all(&tx)?,
                mappings: mappings::load_all(&tx)?,
            };
            tx.commit()?;
            Ok(state)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
