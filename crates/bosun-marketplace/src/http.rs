// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP registry backend.
//!
//! Endpoints, relative to the configured base URL:
//! - `GET /plugins` returns a JSON array of [`RegistryListing`]
//! - `GET /plugins/{id}/{version}` (or `/latest`) returns a [`PackageDocument`]

use std::time::Duration;

use async_trait::async_trait;
use bosun_core::BosunError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::registry::{PackageDocument, RegistryListing};
use crate::source::RegistrySource;

/// Registry client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistry {
    /// Creates a registry client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BosunError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bosun/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BosunError::RegistryUnreachable {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<(StatusCode, Option<T>), BosunError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BosunError::RegistryUnreachable {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, url, "registry response received");
        if !status.is_success() {
            return Ok((status, None));
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| BosunError::RegistryUnreachable {
                message: format!("failed to parse registry response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok((status, Some(body)))
    }
}

#[async_trait]
impl RegistrySource for HttpRegistry {
    async fn fetch_listings(&self) -> Result<Vec<RegistryListing>, BosunError> {
        let url = format!("{}/plugins", self.base_url);
        match self.get_json::<Vec<RegistryListing>>(&url).await? {
            (_, Some(listings)) => Ok(listings),
            (status, None) => Err(BosunError::RegistryUnreachable {
                message: format!("registry returned {status}"),
                source: None,
            }),
        }
    }

    async fn fetch_package(
        &self,
        plugin_id: &str,
        version: Option<&str>,
    ) -> Result<PackageDocument, BosunError> {
        let url = format!(
            "{}/plugins/{}/{}",
            self.base_url,
            plugin_id,
            version.unwrap_or("latest")
        );
        match self.get_json::<PackageDocument>(&url).await? {
            (_, Some(document)) => Ok(document),
            (StatusCode::NOT_FOUND, None) => Err(BosunError::install_failed(
                plugin_id,
                format!("version {} not found in registry", version.unwrap_or("latest")),
            )),
            (status, None) => Err(BosunError::RegistryUnreachable {
                message: format!("registry returned {status}"),
                source: None,
            }),
        }
    }
}
