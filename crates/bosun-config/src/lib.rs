// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Bosun engine.
//!
//! TOML configuration with strict validation (`deny_unknown_fields`), XDG file
//! hierarchy lookup, `BOSUN_*` environment overrides, and miette diagnostics
//! with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use bosun_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::BosunConfig;

/// Load from the standard file hierarchy plus `BOSUN_*` overrides, then validate.
pub fn load_and_validate() -> Result<BosunConfig, Vec<ConfigError>> {
    finish(loader::load_config(), known_config_files)
}

/// Like [`load_and_validate`] but reads a single explicit file.
pub fn load_and_validate_path(path: &Path) -> Result<BosunConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_sources([path.to_path_buf()])
    })
}

/// Parse and validate inline TOML. No files or environment are consulted.
pub fn load_and_validate_str(toml_content: &str) -> Result<BosunConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validation failures are all reported together; extraction failures are
/// converted with spans resolved against whatever `sources` returns.
fn finish(
    extracted: Result<BosunConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<BosunConfig, Vec<ConfigError>> {
    let config = extracted.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn known_config_files() -> Vec<(String, String)> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("bosun.toml"));
    }
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("bosun").join("bosun.toml"));
    }
    candidates.push(PathBuf::from("/etc/bosun/bosun.toml"));
    read_sources(candidates)
}

fn read_sources(paths: impl IntoIterator<Item = PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|p| {
            let content = std::fs::read_to_string(&p).ok()?;
            Some((p.display().to_string(), content))
        })
        .collect()
}
