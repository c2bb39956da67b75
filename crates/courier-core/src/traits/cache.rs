// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value cache collaborator for the cache-aside read path.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CourierError;

/// Byte-oriented key-value cache with per-entry TTL.
///
/// Values are JSON-serialized aggregates. The cache is strictly a read
/// accelerator: the durable store remains the source of truth, and callers
/// must treat every cache failure as a miss.
#[async_trait]
pub trait KvCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CourierError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CourierError>;
}
