// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The registry backend seam.

use async_trait::async_trait;
use bosun_core::BosunError;

use crate::registry::{PackageDocument, RegistryListing};

/// A source of plugin listings and packages.
///
/// Implementations report transport failures as
/// [`BosunError::RegistryUnreachable`] and unknown packages or versions as
/// [`BosunError::InstallFailed`]. They never retry.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// All plugins the registry offers.
    async fn fetch_listings(&self) -> Result<Vec<RegistryListing>, BosunError>;

    /// The package of one plugin. `None` asks for the latest version.
    async fn fetch_package(
        &self,
        plugin_id: &str,
        version: Option<&str>,
    ) -> Result<PackageDocument, BosunError>;
}
