// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` starts a real [`Engine`] on a temporary SQLite file with a
//! [`MockRegistry`] behind its marketplace client. [`TestHarness::restart`]
//! reopens the same database to exercise persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bosun_config::BosunConfig;
use bosun_core::BosunError;
use bosun_engine::Engine;
use bosun_marketplace::MarketplaceClient;
use bosun_storage::Database;

use crate::mock_registry::MockRegistry;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    seed_builtins: bool,
    ingest_queue_capacity: Option<usize>,
    store_payloads: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            seed_builtins: false,
            ingest_queue_capacity: None,
            store_payloads: false,
        }
    }

    /// Seed the bundled built-in plugins on start. Off by default.
    pub fn with_builtins(mut self) -> Self {
        self.seed_builtins = true;
        self
    }

    pub fn with_ingest_queue_capacity(mut self, capacity: usize) -> Self {
        self.ingest_queue_capacity = Some(capacity);
        self
    }

    /// Write fetched plugin payloads below the harness temp directory.
    pub fn with_payload_dir(mut self) -> Self {
        self.store_payloads = true;
        self
    }

    /// Build the test harness and start the engine.
    pub async fn build(self) -> Result<TestHarness, BosunError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| BosunError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = BosunConfig::default();
        config.storage.database_path = db_path.to_string_lossy().into_owned();
        config.plugins.seed_builtins = self.seed_builtins;
        if let Some(capacity) = self.ingest_queue_capacity {
            config.engine.ingest_queue_capacity = capacity;
        }
        if self.store_payloads {
            config.marketplace.payload_dir =
                Some(temp_dir.path().join("payloads").to_string_lossy().into_owned());
        }

        let registry = MockRegistry::new();
        let engine = start_engine(&config, &db_path, &registry).await?;

        Ok(TestHarness {
            engine,
            registry,
            config,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

async fn start_engine(
    config: &BosunConfig,
    db_path: &Path,
    registry: &MockRegistry,
) -> Result<Engine, BosunError> {
    let db = Database::open(db_path, config.storage.wal_mode).await?;
    let client = Arc::new(MarketplaceClient::new(Arc::new(registry.clone())));
    Engine::start(config, db, Some(client)).await
}

/// A running engine on temp storage with a scriptable registry.
pub struct TestHarness {
    /// The engine under test.
    pub engine: Engine,
    /// Registry behind the engine's marketplace client.
    pub registry: MockRegistry,
    /// Configuration the engine was started with.
    pub config: BosunConfig,
    /// Path of the temp SQLite database.
    pub db_path: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Shut the engine down and start a fresh one on the same database.
    pub async fn restart(&mut self) -> Result<(), BosunError> {
        self.engine.shutdown().await;
        self.engine = start_engine(&self.config, &self.db_path, &self.registry).await?;
        Ok(())
    }

    /// Open a second handle on the engine's database file.
    ///
    /// Tests use it to tamper with the schema underneath a running engine.
    pub async fn side_database(&self) -> Result<Database, BosunError> {
        Database::open(&self.db_path, self.config.storage.wal_mode).await
    }

    /// Wait until the writer has drained ingest and published a snapshot
    /// with at least `events` ingest outcomes counted.
    pub async fn settle_ingest(&self, events: u64) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let stats = self.engine.stats();
            if stats.accepted + stats.unmapped + stats.rejected >= events
                || tokio::time::Instant::now() >= deadline
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
