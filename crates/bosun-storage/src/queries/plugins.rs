// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin instance rows.

use std::str::FromStr;

use bosun_core::{BosunError, PluginStatus};
use bosun_plugin::{PluginInstance, PluginManifest};
use rusqlite::{params, Connection};

use super::decode_err;
use crate::database::Database;

/// Insert or update a plugin row. An update keeps the row's install position.
pub(crate) fn upsert(conn: &Connection, instance: &PluginInstance) -> rusqlite::Result<()> {
    let manifest_json = serde_json::to_string(&instance.manifest)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT INTO plugins (plugin_id, manifest_json, installed_version, status, last_error)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(plugin_id) DO UPDATE SET
            manifest_json = excluded.manifest_json,
            installed_version = excluded.installed_version,
            status = excluded.status,
            last_error = excluded.last_error,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        params![
            instance.id(),
            manifest_json,
            instance.installed_version,
            instance.status.to_string(),
            instance.last_error,
        ],
    )?;
    Ok(())
}

pub(crate) fn delete(conn: &Connection, plugin_id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM plugins WHERE plugin_id = ?1", params![plugin_id])?;
    Ok(())
}

pub(crate) fn load_all(conn: &Connection) -> rusqlite::Result<Vec<PluginInstance>> {
    let mut stmt = conn.prepare(
        "SELECT manifest_json, installed_version, status, last_error
         FROM plugins ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let manifest_json: String = row.get(0)?;
        let status: String = row.get(2)?;
        let manifest: PluginManifest =
            serde_json::from_str(&manifest_json).map_err(|e| decode_err(0, e))?;
        Ok(PluginInstance {
            manifest,
            installed_version: row.get(1)?,
            status: PluginStatus::from_str(&status).map_err(|e| decode_err(2, e))?,
            last_error: row.get(3)?,
        })
    })?;
    rows.collect()
}

/// List persisted plugin instances in install order.
pub async fn list_plugins(db: &Database) -> Result<Vec<PluginInstance>, BosunError> {
    db.connection()
        .call(|conn| load_all(conn))
        .await
        .map_err(crate::database::map_tr_err)
}
