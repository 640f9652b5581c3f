// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marketplace client: registry refresh with supersession and package fetch.

use std::sync::Arc;

use arc_swap::ArcSwap;
use bosun_core::BosunError;
use bosun_plugin::PluginInstance;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{
    entries_from_listings, search_entries, verify_package, RegistryEntry, RegistryListing,
    VerifiedPackage,
};
use crate::source::RegistrySource;

/// Token of the refresh currently in flight, tagged with its sequence number.
struct InFlight {
    seq: u64,
    token: CancellationToken,
}

/// Registry access shared by the engine and the CLI.
///
/// Keeps the listings of the last successful refresh. Starting a refresh
/// cancels the one still in flight, which then fails with
/// [`BosunError::RefreshSuperseded`].
pub struct MarketplaceClient {
    source: Arc<dyn RegistrySource>,
    last_good: ArcSwap<Vec<RegistryListing>>,
    in_flight: Mutex<Option<InFlight>>,
    next_seq: std::sync::atomic::AtomicU64,
}

impl MarketplaceClient {
    pub fn new(source: Arc<dyn RegistrySource>) -> Self {
        Self {
            source,
            last_good: ArcSwap::from_pointee(Vec::new()),
            in_flight: Mutex::new(None),
            next_seq: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Fetch the registry listings and join them with `installed`.
    ///
    /// On failure the previous snapshot stays available through
    /// [`cached_entries`](Self::cached_entries). No automatic retry.
    pub async fn refresh_registry(
        &self,
        installed: &[PluginInstance],
    ) -> Result<Vec<RegistryEntry>, BosunError> {
        let seq = self
            .next_seq
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let token = CancellationToken::new();
        {
            let mut guard = self.in_flight.lock().await;
            if let Some(previous) = guard.replace(InFlight {
                seq,
                token: token.clone(),
            }) {
                debug!(superseded = previous.seq, seq, "superseding in-flight registry refresh");
                previous.token.cancel();
            }
        }

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(BosunError::RefreshSuperseded),
            fetched = self.source.fetch_listings() => fetched,
        };

        {
            let mut guard = self.in_flight.lock().await;
            if guard.as_ref().is_some_and(|f| f.seq == seq) {
                guard.take();
            }
        }

        match result {
            Ok(listings) => {
                info!(count = listings.len(), "registry refreshed");
                let entries = entries_from_listings(&listings, installed);
                self.last_good.store(Arc::new(listings));
                Ok(entries)
            }
            Err(e) => {
                if !matches!(e, BosunError::RefreshSuperseded) {
                    warn!(error = %e, "registry refresh failed, keeping last good snapshot");
                }
                Err(e)
            }
        }
    }

    /// Entries of the last successful refresh. Empty before the first one.
    pub fn cached_entries(&self, installed: &[PluginInstance]) -> Vec<RegistryEntry> {
        entries_from_listings(&self.last_good.load(), installed)
    }

    /// Search the cached entries by id, name or description.
    pub fn search(&self, query: &str, installed: &[PluginInstance]) -> Vec<RegistryEntry> {
        search_entries(self.cached_entries(installed), query)
    }

    /// Fetch and verify a plugin package. `None` selects the latest version.
    ///
    /// Every failure, including an unreachable registry, is reported as
    /// [`BosunError::InstallFailed`].
    pub async fn fetch_package(
        &self,
        plugin_id: &str,
        version: Option<&str>,
    ) -> Result<VerifiedPackage, BosunError> {
        let document = self
            .source
            .fetch_package(plugin_id, version)
            .await
            .map_err(|e| match e {
                BosunError::InstallFailed { .. } => e,
                other => BosunError::install_failed(plugin_id, other.to_string()),
            })?;
        let package = verify_package(document, plugin_id, version)?;
        debug!(plugin_id, version = %package.manifest.version, bytes = package.payload.len(), "package verified");
        Ok(package)
    }
}
