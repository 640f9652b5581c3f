// SPDX-FileCopyrightText: 2026 Bosun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog of data streams currently available for mapping.
//!
//! The catalog is a pure derivation from the enabled plugin instances and is
//! rebuilt whenever a plugin's status or manifest changes. It is never mutated
//! directly.

use bosun_core::DataType;
use serde::{Deserialize, Serialize};

use crate::store::PluginInstance;

/// One live data feed an enabled driver can emit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub plugin_id: String,
    pub stream_id: String,
    pub stream_name: String,
    pub data_type: DataType,
}

/// Streams advertised by all enabled plugins, in install then declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamCatalog {
    streams: Vec<StreamDescriptor>,
}

impl StreamCatalog {
    /// Derive the catalog from plugin instances. Only `enabled` plugins contribute.
    pub fn derive(instances: &[PluginInstance]) -> Self {
        let streams = instances
            .iter()
            .filter(|i| i.status.publishes_streams())
            .flat_map(|i| {
                i.manifest.streams().iter().map(move |s| StreamDescriptor {
                    plugin_id: i.manifest.id.clone(),
                    stream_id: s.id.clone(),
                    stream_name: s.name.clone(),
                    data_type: s.data_type.clone(),
                })
            })
            .collect();
        Self { streams }
    }

    /// All available streams.
    pub fn available_streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    /// Available streams carrying the given data type.
    pub fn streams_for_data_type(&self, data_type: &DataType) -> Vec<&StreamDescriptor> {
        self.streams
            .iter()
            .filter(|s| &s.data_type == data_type)
            .collect()
    }

    /// Available streams of one plugin.
    pub fn streams_for_plugin<'a>(
        &'a self,
        plugin_id: &'a str,
    ) -> impl Iterator<Item = &'a StreamDescriptor> + 'a {
        self.streams.iter().filter(move |s| s.plugin_id == plugin_id)
    }

    /// Look up one available stream.
    pub fn find(&self, plugin_id: &str, stream_id: &str) -> Option<&StreamDescriptor> {
        self.streams
            .iter()
            .find(|s| s.plugin_id == plugin_id && s.stream_id == stream_id)
    }

    /// Number of streams published by enabled plugins.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// True when no enabled plugin publishes a stream.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
