// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot CLI commands against the local engine database.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bosun_config::BosunConfig;
use bosun_core::{BosunError, DataType};
use bosun_engine::Engine;
use bosun_marketplace::{HttpRegistry, MarketplaceClient};
use bosun_plugin::{parse_manifest_json, parse_manifest_toml, PluginManifest};
use bosun_sensors::{SlotCatalog, SlotCategory};
use bosun_storage::Database;
use tracing::debug;

use crate::output::{self, Style};
use crate::Commands;

/// Open the configured database and start an engine on it.
pub async fn open_engine(config: &BosunConfig) -> Result<Engine, BosunError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    Engine::start(config, db, marketplace_client(config)?).await
}

/// The marketplace client for the configured registry, if any.
pub fn marketplace_client(
    config: &BosunConfig,
) -> Result<Option<Arc<MarketplaceClient>>, BosunError> {
    let Some(url) = &config.marketplace.registry_url else {
        return Ok(None);
    };
    let registry = HttpRegistry::new(
        url.as_str(),
        Duration::from_secs(config.marketplace.request_timeout_secs),
    )?;
    debug!(registry = %registry.base_url(), "marketplace configured");
    Ok(Some(Arc::new(MarketplaceClient::new(Arc::new(registry)))))
}

/// Read a manifest file; `.toml` files are parsed as `plugin.toml`, anything
/// else as `manifest.json`.
pub async fn read_manifest(path: &Path) -> Result<PluginManifest, BosunError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        BosunError::InvalidManifest(format!("cannot read {}: {e}", path.display()))
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_manifest_toml(&content),
        _ => parse_manifest_json(&content),
    }
}

pub async fn run(config: &BosunConfig, command: Commands, style: Style) -> Result<(), BosunError> {
    if let Commands::Slots { category } = &command {
        return list_slots(category.as_deref(), style);
    }

    let engine = open_engine(config).await?;
    let result = execute(&engine, command, style).await;
    engine.shutdown().await;
    result
}

fn list_slots(category: Option<&str>, style: Style) -> Result<(), BosunError> {
    let catalog = SlotCatalog::marine();
    let slots = match category {
        Some(name) => {
            let category = SlotCategory::from_str(name)
                .map_err(|_| BosunError::Config(format!("unknown slot category `{name}`")))?;
            catalog.by_category(category)
        }
        None => catalog.slots().iter().collect(),
    };
    output::print_slots(&slots, style);
    Ok(())
}

async fn execute(engine: &Engine, command: Commands, style: Style) -> Result<(), BosunError> {
    match command {
        Commands::Serve | Commands::Slots { .. } => {
            Err(BosunError::Internal("command handled elsewhere".to_string()))
        }
        Commands::Plugins => {
            output::print_instances(&engine.list_instances(), style);
            Ok(())
        }
        Commands::Streams { data_type } => {
            let mut streams = engine.available_streams();
            if let Some(data_type) = data_type {
                let wanted = DataType::from(data_type.as_str());
                streams.retain(|s| s.data_type == wanted);
            }
            output::print_streams(&streams, style);
            Ok(())
        }
        Commands::Mappings => {
            let report = engine.monitor_report(0);
            output::print_mappings(&report.mappings, &report.freshness, style);
            Ok(())
        }
        Commands::Install {
            manifest,
            registry,
            version,
        } => {
            let instance = match (manifest, registry) {
                (_, Some(plugin_id)) => {
                    engine
                        .install_from_marketplace(&plugin_id, version.as_deref())
                        .await?
                }
                (Some(path), None) => engine.install(read_manifest(&path).await?).await?,
                (None, None) => {
                    return Err(BosunError::Config(
                        "install needs a manifest path or --registry".to_string(),
                    ))
                }
            };
            output::print_instance("installed", &instance, style);
            Ok(())
        }
        Commands::Uninstall { plugin_id } => {
            let instance = engine.uninstall(&plugin_id).await?;
            output::print_instance("uninstalled", &instance, style);
            Ok(())
        }
        Commands::Enable { plugin_id } => {
            let instance = engine.enable(&plugin_id).await?;
            output::print_instance("enabled", &instance, style);
            Ok(())
        }
        Commands::Disable { plugin_id } => {
            let instance = engine.disable(&plugin_id).await?;
            output::print_instance("disabled", &instance, style);
            Ok(())
        }
        Commands::Bind {
            slot_type,
            plugin_id,
            stream_id,
        } => {
            let mapping = engine.bind(&slot_type, &plugin_id, &stream_id).await?;
            output::print_mapping(&mapping, style);
            Ok(())
        }
        Commands::Unbind {
            slot_type,
            plugin_id,
            stream_id,
        } => {
            let removed = engine.unbind(&slot_type, &plugin_id, &stream_id).await?;
            if style.json {
                output::print_json(&serde_json::json!({ "removed": removed }));
            } else if removed {
                println!("unbound {slot_type}");
            } else {
                println!("{slot_type} is not bound to {plugin_id}/{stream_id}; nothing to do");
            }
            Ok(())
        }
        Commands::Automap { plugin_id } => {
            let created = engine.auto_map(&plugin_id).await?;
            if style.json {
                output::print_json(&created);
            } else {
                println!("auto-mapped {} slot(s) for {plugin_id}", created.len());
                for mapping in &created {
                    output::print_mapping(mapping, style);
                }
            }
            Ok(())
        }
        Commands::Registry { search } => {
            let entries = engine.refresh_registry().await?;
            let entries = match search {
                Some(query) => engine.search_registry(&query)?,
                None => entries,
            };
            output::print_registry(&entries, style);
            Ok(())
        }
    }
}
