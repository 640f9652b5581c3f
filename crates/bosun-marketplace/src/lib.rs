// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin marketplace for Bosun.
//!
//! Lists plugins offered by a remote registry, flags available updates
//! against the installed set, and fetches verified plugin packages. The
//! engine drives install and update; this crate never mutates local state.

pub mod client;
pub mod http;
pub mod registry;
pub mod source;

pub use client::MarketplaceClient;
pub use http::HttpRegistry;
pub use registry::{
    entries_from_listings, is_newer, verify_package, PackageDocument, RegistryEntry,
    RegistryListing, VerifiedPackage,
};
pub use source::RegistrySource;
