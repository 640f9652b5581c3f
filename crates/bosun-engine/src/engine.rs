// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine handle and its single writer task.
//!
//! All mutations travel through a bounded command mailbox and are applied
//! one at a time by the writer. Each command runs against a copy of the
//! state, its changes are persisted in one transaction, and only then is the
//! copy adopted and a new [`EngineSnapshot`] published. A failed command
//! leaves both storage and the published state untouched.
//!
//! Sensor values take a separate non-blocking path through the ingest queue
//! and are drained by the writer between commands.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use bosun_config::BosunConfig;
use bosun_core::{BosunError, PluginStatus, SensorValue, Timestamp};
use bosun_marketplace::{MarketplaceClient, RegistryEntry, VerifiedPackage};
use bosun_plugin::{builtin_catalog, PluginInstance, PluginManifest, StreamDescriptor};
use bosun_sensors::{DebugTap, IngestOutcome, SensorMapping, SlotCatalog, TapEntry};
use bosun_storage::Database;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ingest::{IngestCounters, IngestEvent, IngestQueue, IngestStats};
use crate::metrics;
use crate::snapshot::{EngineSnapshot, MonitorReport};
use crate::state::{EngineState, Op, Outcome};
use crate::subscription::Subscription;

/// A queued mutation and the channel its result goes back on.
struct Command {
    op: Op,
    reply: oneshot::Sender<Result<Outcome, BosunError>>,
}

/// State shared between the handle, the writer and subscription tasks.
pub(crate) struct Shared {
    snapshot: ArcSwap<EngineSnapshot>,
    version: watch::Sender<u64>,
    tap: Mutex<DebugTap>,
    counters: IngestCounters,
    ingest: IngestQueue,
}

impl Shared {
    pub(crate) fn recent(&self, limit: usize) -> Vec<TapEntry> {
        self.tap
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .recent(limit)
    }

    pub(crate) fn monitor_report(&self, tap_entries: usize, now: Timestamp) -> MonitorReport {
        MonitorReport::build(
            &self.snapshot.load(),
            self.recent(tap_entries),
            self.counters.snapshot(),
            now,
        )
    }
}

struct Inner {
    commands: mpsc::Sender<Command>,
    shared: Arc<Shared>,
    slots: SlotCatalog,
    marketplace: Option<Arc<MarketplaceClient>>,
    payload_dir: Option<PathBuf>,
    poll_interval: Duration,
    cancel: CancellationToken,
    writer: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Cloneable handle to a running engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    /// Restore state from `db`, seed built-in plugins if configured and
    /// spawn the writer task.
    pub async fn start(
        config: &BosunConfig,
        db: Database,
        marketplace: Option<Arc<MarketplaceClient>>,
    ) -> Result<Self, BosunError> {
        metrics::register_metrics();
        let slots = SlotCatalog::marine();

        let persisted = bosun_storage::load(&db).await?;
        let (mut state, fixes) = EngineState::restore(slots.clone(), persisted);
        bosun_storage::apply(&db, fixes).await?;

        if config.plugins.seed_builtins {
            for manifest in builtin_catalog()? {
                if state.store.get(&manifest.id).is_some() {
                    continue;
                }
                let mut next = state.clone();
                let (_, changes) = next.apply(Op::Install(manifest))?;
                bosun_storage::apply(&db, changes).await?;
                state = next;
            }
        }

        let snapshot = EngineSnapshot::capture(1, &state);
        let (version, _) = watch::channel(snapshot.version);
        let shared = Arc::new(Shared {
            snapshot: ArcSwap::from_pointee(snapshot),
            version,
            tap: Mutex::new(DebugTap::new(config.monitor.debug_tap_capacity)),
            counters: IngestCounters::default(),
            ingest: IngestQueue::new(config.engine.ingest_queue_capacity),
        });
        metrics::set_active_mappings(state.mappings.active_count());

        let (commands, mailbox) = mpsc::channel(config.engine.command_buffer.max(1));
        let cancel = CancellationToken::new();
        let writer = Writer {
            state,
            db,
            shared: shared.clone(),
            mailbox,
            cancel: cancel.clone(),
            version: 1,
        };
        let handle = tokio::spawn(writer.run());

        info!(
            plugins = shared.snapshot.load().instances.len(),
            marketplace = marketplace.is_some(),
            "engine started"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                commands,
                shared,
                slots,
                marketplace,
                payload_dir: config.marketplace.payload_dir.as_ref().map(PathBuf::from),
                poll_interval: Duration::from_millis(config.monitor.poll_interval_ms),
                cancel,
                writer: tokio::sync::Mutex::new(Some(handle)),
            }),
        })
    }

    async fn send(&self, op: Op) -> Result<Outcome, BosunError> {
        let (reply, rx) = oneshot::channel();
        self.inner
            .commands
            .send(Command { op, reply })
            .await
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())?
    }

    // --- write API ---

    pub async fn install(&self, manifest: PluginManifest) -> Result<PluginInstance, BosunError> {
        into_instance(self.send(Op::Install(manifest)).await?)
    }

    pub async fn uninstall(&self, plugin_id: &str) -> Result<PluginInstance, BosunError> {
        into_instance(self.send(Op::Uninstall(plugin_id.to_string())).await?)
    }

    pub async fn enable(&self, plugin_id: &str) -> Result<PluginInstance, BosunError> {
        into_instance(self.send(Op::Enable(plugin_id.to_string())).await?)
    }

    pub async fn disable(&self, plugin_id: &str) -> Result<PluginInstance, BosunError> {
        into_instance(self.send(Op::Disable(plugin_id.to_string())).await?)
    }

    pub async fn bind(
        &self,
        slot_type: &str,
        plugin_id: &str,
        stream_id: &str,
    ) -> Result<SensorMapping, BosunError> {
        let op = Op::Bind {
            slot_type: slot_type.to_string(),
            plugin_id: plugin_id.to_string(),
            stream_id: stream_id.to_string(),
        };
        match self.send(op).await? {
            Outcome::Mapping(mapping) => Ok(mapping),
            other => Err(unexpected(other)),
        }
    }

    /// Remove the mapping only if it binds exactly this slot and stream.
    pub async fn unbind(
        &self,
        slot_type: &str,
        plugin_id: &str,
        stream_id: &str,
    ) -> Result<bool, BosunError> {
        let op = Op::Unbind {
            slot_type: slot_type.to_string(),
            plugin_id: plugin_id.to_string(),
            stream_id: stream_id.to_string(),
        };
        match self.send(op).await? {
            Outcome::Unbound(removed) => Ok(removed),
            other => Err(unexpected(other)),
        }
    }

    /// Bind unambiguous slots to the plugin's streams. Returns the new mappings.
    pub async fn auto_map(&self, plugin_id: &str) -> Result<Vec<SensorMapping>, BosunError> {
        match self.send(Op::AutoMap(plugin_id.to_string())).await? {
            Outcome::Mapped(created) => Ok(created),
            other => Err(unexpected(other)),
        }
    }

    /// Put a plugin into `error` status with a diagnostic.
    pub async fn report_plugin_error(
        &self,
        plugin_id: &str,
        message: &str,
    ) -> Result<PluginInstance, BosunError> {
        let op = Op::ReportError {
            plugin_id: plugin_id.to_string(),
            message: message.to_string(),
        };
        into_instance(self.send(op).await?)
    }

    /// Install a plugin from the registry, or update it in place when it is
    /// already installed. `None` selects the latest version.
    ///
    /// The package is fetched outside the writer. A fresh install stores its
    /// payload only once the install has committed; if another caller
    /// installed the same id meanwhile, the fetched package becomes an
    /// update. During an update the instance shows `loading`; on failure its
    /// previous status is restored.
    pub async fn install_from_marketplace(
        &self,
        plugin_id: &str,
        version: Option<&str>,
    ) -> Result<PluginInstance, BosunError> {
        let client = self.marketplace()?;

        let mut prefetched = None;
        if self.inner.shared.snapshot.load().instance(plugin_id).is_none() {
            let package = client.fetch_package(plugin_id, version).await?;
            match self.install(package.manifest.clone()).await {
                Ok(instance) => return self.keep_fresh_install(instance, &package).await,
                Err(BosunError::DuplicatePlugin { .. }) => {
                    debug!(plugin_id, "installed concurrently, applying fetched package as update");
                    prefetched = Some(package);
                }
                Err(e) => return Err(e),
            }
        }

        let previous = match self.send(Op::BeginUpdate(plugin_id.to_string())).await? {
            Outcome::Status(status) => status,
            other => return Err(unexpected(other)),
        };

        let package = match prefetched {
            Some(package) => Ok(package),
            None => client.fetch_package(plugin_id, version).await,
        };
        let fetched = match package {
            Ok(package) => self.store_payload(&package).await.map(|()| package.manifest),
            Err(e) => Err(e),
        };
        let result = match fetched {
            Ok(manifest) => self.finish_update(plugin_id, previous, Some(manifest)).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!(plugin_id, error = %e, "plugin update failed, restoring previous status");
            if let Err(restore) = self.finish_update(plugin_id, previous, None).await {
                warn!(plugin_id, error = %restore, "could not restore plugin status");
            }
        }
        result
    }

    /// Store the payload of a committed fresh install. The install is undone
    /// when the payload cannot be written.
    async fn keep_fresh_install(
        &self,
        instance: PluginInstance,
        package: &VerifiedPackage,
    ) -> Result<PluginInstance, BosunError> {
        if let Err(e) = self.store_payload(package).await {
            warn!(plugin_id = %instance.id(), error = %e, "payload not stored, rolling back install");
            if let Err(rollback) = self.uninstall(instance.id()).await {
                warn!(plugin_id = %instance.id(), error = %rollback, "could not roll back install");
            }
            return Err(e);
        }
        Ok(instance)
    }

    async fn finish_update(
        &self,
        plugin_id: &str,
        previous: PluginStatus,
        manifest: Option<PluginManifest>,
    ) -> Result<PluginInstance, BosunError> {
        let op = Op::FinishUpdate {
            plugin_id: plugin_id.to_string(),
            previous,
            manifest,
        };
        into_instance(self.send(op).await?)
    }

    async fn store_payload(&self, package: &VerifiedPackage) -> Result<(), BosunError> {
        let Some(dir) = &self.inner.payload_dir else {
            return Ok(());
        };
        let id = &package.manifest.id;
        let path = dir.join(format!("{id}-{}.pkg", package.manifest.version));
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| BosunError::install_failed(id, format!("{}: {e}", dir.display())))?;
        tokio::fs::write(&path, &package.payload)
            .await
            .map_err(|e| BosunError::install_failed(id, format!("{}: {e}", path.display())))?;
        debug!(plugin_id = %id, path = %path.display(), bytes = package.payload.len(), "payload stored");
        Ok(())
    }

    /// Refresh the registry listings against the installed plugins.
    pub async fn refresh_registry(&self) -> Result<Vec<RegistryEntry>, BosunError> {
        let client = self.marketplace()?;
        let snapshot = self.inner.shared.snapshot.load_full();
        let result = client.refresh_registry(&snapshot.instances).await;
        if result
            .as_ref()
            .is_err_and(|e| !matches!(e, BosunError::RefreshSuperseded))
        {
            metrics::record_refresh_failure();
        }
        result
    }

    /// Entries of the last successful refresh.
    pub fn registry_entries(&self) -> Result<Vec<RegistryEntry>, BosunError> {
        let client = self.marketplace()?;
        Ok(client.cached_entries(&self.inner.shared.snapshot.load().instances))
    }

    pub fn search_registry(&self, query: &str) -> Result<Vec<RegistryEntry>, BosunError> {
        let client = self.marketplace()?;
        Ok(client.search(query, &self.inner.shared.snapshot.load().instances))
    }

    fn marketplace(&self) -> Result<&Arc<MarketplaceClient>, BosunError> {
        self.inner
            .marketplace
            .as_ref()
            .ok_or_else(|| BosunError::Config("no marketplace registry_url configured".to_string()))
    }

    // --- ingest ---

    /// Queue a sensor value. Never waits; the oldest queued value is dropped
    /// when the queue is full.
    pub fn ingest(
        &self,
        plugin_id: &str,
        stream_id: &str,
        value: SensorValue,
        timestamp: Timestamp,
    ) {
        let evicted = self.inner.shared.ingest.push(IngestEvent {
            plugin_id: plugin_id.to_string(),
            stream_id: stream_id.to_string(),
            value,
            timestamp,
        });
        if evicted {
            self.inner
                .shared
                .counters
                .dropped
                .fetch_add(1, Ordering::Relaxed);
            metrics::record_dropped();
        }
    }

    /// Count an ingest record that could not be decoded before reaching
    /// the engine. It shows up as `rejected` in [`IngestStats`].
    pub fn reject_malformed(&self) {
        self.inner
            .shared
            .counters
            .rejected
            .fetch_add(1, Ordering::Release);
        metrics::record_malformed();
    }

    // --- read API ---

    /// The last committed snapshot.
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.inner.shared.snapshot.load_full()
    }

    /// Installed plugins in install order.
    pub fn list_instances(&self) -> Vec<PluginInstance> {
        self.snapshot().instances.clone()
    }

    /// Streams published by enabled drivers.
    pub fn available_streams(&self) -> Vec<StreamDescriptor> {
        self.snapshot().streams.clone()
    }

    /// Current mappings with their cached values.
    pub fn mappings(&self) -> Vec<SensorMapping> {
        self.snapshot().mappings.clone()
    }

    pub fn slots(&self) -> &SlotCatalog {
        &self.inner.slots
    }

    /// The last `limit` debug tap entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<TapEntry> {
        self.inner.shared.recent(limit)
    }

    /// Ingest counters since start.
    pub fn stats(&self) -> IngestStats {
        self.inner.shared.counters.snapshot()
    }

    /// A one-off report of mappings, freshness and recent ingest events.
    pub fn monitor_report(&self, tap_entries: usize) -> MonitorReport {
        self.inner
            .shared
            .monitor_report(tap_entries, chrono::Utc::now())
    }

    /// Snapshot version, updated on every publish.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.inner.shared.version.subscribe()
    }

    /// Periodic monitor reports. `None` uses the configured poll interval.
    pub fn subscribe(&self, interval: Option<Duration>) -> Subscription {
        Subscription::spawn(
            self.inner.shared.clone(),
            interval.unwrap_or(self.inner.poll_interval),
        )
    }

    /// Stop the writer after it has applied every queued command.
    ///
    /// Commands sent afterwards fail. Calling this twice is harmless.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.writer.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "engine writer task failed");
            }
        }
    }
}

fn stopped() -> BosunError {
    BosunError::Internal("engine is shut down".to_string())
}

fn unexpected(outcome: Outcome) -> BosunError {
    BosunError::Internal(format!("unexpected command outcome: {outcome:?}"))
}

fn into_instance(outcome: Outcome) -> Result<PluginInstance, BosunError> {
    match outcome {
        Outcome::Instance(instance) => Ok(instance),
        other => Err(unexpected(other)),
    }
}

/// Owns the mutable state. Runs until the mailbox closes or shutdown.
struct Writer {
    state: EngineState,
    db: Database,
    shared: Arc<Shared>,
    mailbox: mpsc::Receiver<Command>,
    cancel: CancellationToken,
    version: u64,
}

impl Writer {
    async fn run(mut self) {
        debug!("engine writer running");
        loop {
            tokio::select! {
                biased;
                command = self.mailbox.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                () = self.shared.ingest.notified() => self.drain_ingest(),
                () = self.cancel.cancelled() => break,
            }
        }

        self.mailbox.close();
        while let Some(command) = self.mailbox.recv().await {
            self.handle(command).await;
        }
        self.drain_ingest();

        if let Err(e) = self.db.checkpoint().await {
            warn!(error = %e, "WAL checkpoint on shutdown failed");
        }
        info!("engine writer stopped");
    }

    async fn handle(&mut self, Command { op, reply }: Command) {
        let name: &'static str = (&op).into();
        let result = self.commit(op).await;
        metrics::record_command(name, result.is_ok());
        if let Err(e) = &result {
            debug!(command = name, error = %e, "command rejected");
        }
        // The caller may have gone away; the command still took effect.
        let _ = reply.send(result);
    }

    async fn commit(&mut self, op: Op) -> Result<Outcome, BosunError> {
        let mut next = self.state.clone();
        let (outcome, changes) = next.apply(op)?;

        let started = Instant::now();
        bosun_storage::apply(&self.db, changes).await?;
        metrics::record_persist_latency(started.elapsed().as_secs_f64());

        self.state = next;
        self.publish();
        Ok(outcome)
    }

    fn drain_ingest(&mut self) {
        let events = self.shared.ingest.drain();
        if events.is_empty() {
            return;
        }

        let (mut accepted, mut unmapped, mut rejected) = (0, 0, 0);
        {
            let mut tap = self.shared.tap.lock().unwrap_or_else(|e| e.into_inner());
            for event in events {
                let outcome = self.state.mappings.ingest(
                    &event.plugin_id,
                    &event.stream_id,
                    &event.value,
                    event.timestamp,
                    &self.state.streams,
                );
                match &outcome {
                    IngestOutcome::Applied(_) => accepted += 1,
                    IngestOutcome::Unmapped => unmapped += 1,
                    IngestOutcome::Rejected(reason) => {
                        debug!(plugin_id = %event.plugin_id, stream_id = %event.stream_id, %reason, "sensor value rejected");
                        rejected += 1;
                    }
                }
                metrics::record_ingest(&outcome);
                tap.record(TapEntry {
                    plugin_id: event.plugin_id,
                    stream_id: event.stream_id,
                    value: event.value,
                    timestamp: event.timestamp,
                    outcome,
                });
            }
        }

        self.publish();

        // Counts become visible only after the snapshot holding the values.
        let counters = &self.shared.counters;
        counters.accepted.fetch_add(accepted, Ordering::Release);
        counters.unmapped.fetch_add(unmapped, Ordering::Release);
        counters.rejected.fetch_add(rejected, Ordering::Release);
    }

    fn publish(&mut self) {
        self.version += 1;
        let snapshot = EngineSnapshot::capture(self.version, &self.state);
        self.shared.snapshot.store(Arc::new(snapshot));
        self.shared.version.send_replace(self.version);

        metrics::set_active_mappings(self.state.mappings.active_count());
        metrics::set_enabled_plugins(
            self.state
                .store
                .list_instances()
                .iter()
                .filter(|i| i.status == PluginStatus::Enabled)
                .count(),
        );
    }
}
