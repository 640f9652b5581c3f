// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered loading: compiled defaults, then `/etc/bosun`, the user config
//! dir, `./bosun.toml`, and finally `BOSUN_<SECTION>_<KEY>` variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BosunConfig;

/// Config sections that environment variables may target.
const SECTIONS: &[&str] = &["engine", "storage", "marketplace", "monitor", "plugins"];

/// Extract a [`BosunConfig`] from every layer. Later layers win.
pub fn load_config() -> Result<BosunConfig, figment::Error> {
    build_figment().extract()
}

/// Defaults overlaid with `toml_content`. Ignores files and the environment.
pub fn load_config_from_str(toml_content: &str) -> Result<BosunConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BosunConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Defaults, then `path`, then environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<BosunConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BosunConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The unextracted provider stack behind [`load_config`].
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BosunConfig::default()))
        .merge(Toml::file("/etc/bosun/bosun.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("bosun/bosun.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("bosun.toml"))
        .merge(env_provider())
}

/// Keys contain underscores, so only the first one after a known section
/// name becomes a dot: `ENGINE_INGEST_QUEUE_CAPACITY` -> `engine.ingest_queue_capacity`.
fn env_provider() -> Env {
    Env::prefixed("BOSUN_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_first_section_only() {
        assert_eq!(
            map_env_key("engine_ingest_queue_capacity"),
            "engine.ingest_queue_capacity"
        );
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("plugins_seed_builtins"), "plugins.seed_builtins");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}
