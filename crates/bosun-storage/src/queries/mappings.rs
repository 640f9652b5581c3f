// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sensor mapping rows.
//!
//! Only the binding is stored. Cached values are live state and start empty
//! after a restart.

use bosun_core::BosunError;
use bosun_sensors::SensorMapping;
use rusqlite::{params, Connection};

use crate::database::Database;

pub(crate) fn upsert(conn: &Connection, mapping: &SensorMapping) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO mappings (slot_type, plugin_id, stream_id, active)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(slot_type) DO UPDATE SET
            plugin_id = excluded.plugin_id,
            stream_id = excluded.stream_id,
            active = excluded.active,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        params![
            mapping.slot_type,
            mapping.plugin_id,
            mapping.stream_id,
            mapping.active,
        ],
    )?;
    Ok(())
}

pub(crate) fn delete(conn: &Connection, slot_type: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM mappings WHERE slot_type = ?1", params![slot_type])?;
    Ok(())
}

pub(crate) fn load_all(conn: &Connection) -> rusqlite::Result<Vec<SensorMapping>> {
    let mut stmt = conn.prepare(
        "SELECT slot_type, plugin_id, stream_id, active FROM mappings ORDER BY slot_type ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SensorMapping {
            slot_type: row.get(0)?,
            plugin_id: row.get(1)?,
            stream_id: row.get(2)?,
            active: row.get(3)?,
            last_update: None,
            last_value: None,
        })
    })?;
    rows.collect()
}

/// List persisted mappings.
pub async fn list_mappings(db: &Database) -> Result<Vec<SensorMapping>, BosunError> {
    db.connection()
        .call(|conn| load_all(conn))
        .await
        .map_err(crate::database::map_tr_err)
}
