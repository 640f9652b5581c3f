// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory registry for deterministic marketplace tests.
//!
//! `MockRegistry` implements `RegistrySource` over published manifests,
//! with switches for an unreachable registry and slow responses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bosun_core::BosunError;
use bosun_marketplace::{PackageDocument, RegistryListing, RegistrySource};
use bosun_plugin::PluginManifest;
use tokio::sync::Mutex;

use crate::fixtures::{listing_for, package_for};

/// A registry whose contents are set by the test.
///
/// Clones share state, so a test can keep one clone while the engine owns
/// another.
#[derive(Clone, Default)]
pub struct MockRegistry {
    listings: Arc<Mutex<Vec<RegistryListing>>>,
    packages: Arc<Mutex<HashMap<(String, String), PackageDocument>>>,
    unreachable: Arc<AtomicBool>,
    listing_delay: Arc<Mutex<Option<Duration>>>,
    listing_calls: Arc<AtomicUsize>,
    package_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a version. It becomes the advertised latest version.
    pub async fn publish(&self, manifest: &PluginManifest, payload: &[u8]) {
        self.insert_document(package_for(manifest, payload)).await;
        let mut listings = self.listings.lock().await;
        let listing = listing_for(manifest);
        match listings.iter_mut().find(|l| l.id == manifest.id) {
            Some(existing) => *existing = listing,
            None => listings.push(listing),
        }
    }

    /// Serve `document` for its manifest's id and version without touching
    /// the listings. Used to serve tampered packages.
    pub async fn insert_document(&self, document: PackageDocument) {
        let key = (
            document.manifest.id.clone(),
            document.manifest.version.clone(),
        );
        self.packages.lock().await.insert(key, document);
    }

    /// Make every call fail with `RegistryUnreachable`.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Delay listing responses, to keep a refresh in flight.
    pub async fn set_listing_delay(&self, delay: Option<Duration>) {
        *self.listing_delay.lock().await = delay;
    }

    /// Delay package downloads, to hold an install between fetch and commit.
    pub async fn set_package_delay(&self, delay: Option<Duration>) {
        *self.package_delay.lock().await = delay;
    }

    /// Number of listing requests served or failed so far.
    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), BosunError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(BosunError::RegistryUnreachable {
                message: "mock registry is offline".to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RegistrySource for MockRegistry {
    async fn fetch_listings(&self) -> Result<Vec<RegistryListing>, BosunError> {
        let delay = *self.listing_delay.lock().await;
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_reachable()?;
        Ok(self.listings.lock().await.clone())
    }

    async fn fetch_package(
        &self,
        plugin_id: &str,
        version: Option<&str>,
    ) -> Result<PackageDocument, BosunError> {
        let delay = *self.package_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_reachable()?;
        let version = match version {
            Some(v) => v.to_string(),
            None => self
                .listings
                .lock()
                .await
                .iter()
                .find(|l| l.id == plugin_id)
                .map(|l| l.latest_version.clone())
                .ok_or_else(|| BosunError::install_failed(plugin_id, "not in registry"))?,
        };
        self.packages
            .lock()
            .await
            .get(&(plugin_id.to_string(), version.clone()))
            .cloned()
            .ok_or_else(|| {
                BosunError::install_failed(plugin_id, format!("version {version} not in registry"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::gps_driver;
    use bosun_core::ErrorKind;

    #[tokio::test]
    async fn publish_serves_latest_package() {
        let registry = MockRegistry::new();
        let mut manifest = gps_driver();
        registry.publish(&manifest, b"v1").await;
        manifest.version = "1.1.0".to_string();
        registry.publish(&manifest, b"v2").await;

        let listings = registry.fetch_listings().await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].latest_version, "1.1.0");

        let latest = registry.fetch_package("gps-driver", None).await.unwrap();
        assert_eq!(latest.manifest.version, "1.1.0");
        let pinned = registry
            .fetch_package("gps-driver", Some("1.0.0"))
            .await
            .unwrap();
        assert_eq!(pinned.manifest.version, "1.0.0");
    }

    #[tokio::test]
    async fn offline_registry_is_unreachable() {
        let registry = MockRegistry::new();
        registry.set_unreachable(true);
        let err = registry.fetch_listings().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RegistryUnreachable);
        assert_eq!(registry.listing_calls(), 1);
    }

    #[tokio::test]
    async fn unknown_version_fails_install() {
        let registry = MockRegistry::new();
        registry.publish(&gps_driver(), b"v1").await;
        let err = registry
            .fetch_package("gps-driver", Some("9.9.9"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InstallFailed);
    }
}
