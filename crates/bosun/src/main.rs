// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bosun - plugin registry and sensor-mapping engine for marine dashboards.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod output;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bosun - plugin registry and sensor-mapping engine for marine dashboards.
#[derive(Parser, Debug)]
#[command(name = "bosun", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run the engine, reading NDJSON sensor values from stdin.
    Serve,
    /// List the canonical sensor slots.
    Slots {
        /// Only slots of this category (navigation, wind, depth, ...).
        #[arg(long)]
        category: Option<String>,
    },
    /// List installed plugins.
    Plugins,
    /// List streams of enabled drivers.
    Streams {
        /// Only streams of this data type.
        #[arg(long)]
        data_type: Option<String>,
    },
    /// Show slot mappings with their freshness.
    Mappings,
    /// Install a plugin from a manifest file or from the registry.
    Install {
        /// Path to a `manifest.json` or `plugin.toml`.
        #[arg(required_unless_present = "registry")]
        manifest: Option<PathBuf>,
        /// Install or update this plugin id from the marketplace.
        #[arg(long, conflicts_with = "manifest")]
        registry: Option<String>,
        /// Registry version to install; latest when omitted.
        #[arg(long, requires = "registry")]
        version: Option<String>,
    },
    /// Uninstall a plugin and remove its mappings.
    Uninstall { plugin_id: String },
    /// Enable a plugin.
    Enable { plugin_id: String },
    /// Disable a plugin, deactivating its mappings.
    Disable { plugin_id: String },
    /// Bind a slot to a plugin stream.
    Bind {
        slot_type: String,
        plugin_id: String,
        stream_id: String,
    },
    /// Remove a slot binding.
    Unbind {
        slot_type: String,
        plugin_id: String,
        stream_id: String,
    },
    /// Bind unambiguous slots to a plugin's streams.
    Automap { plugin_id: String },
    /// Refresh and list the marketplace registry.
    Registry {
        /// Filter entries by id, name or description.
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => bosun_config::load_and_validate_path(path),
        None => bosun_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            bosun_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    serve::init_tracing(&config.engine.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(command) => {
            let style = output::Style::detect(cli.json, cli.plain);
            commands::run(&config, command, style).await
        }
        None => {
            println!("bosun: use --help for available commands");
            Ok(())
        }
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("bosun: {} ({})", e, e.kind());
            1
        }
    };
    // Exit without waiting on a blocking stdin read left behind by `serve`.
    std::process::exit(code);
}
