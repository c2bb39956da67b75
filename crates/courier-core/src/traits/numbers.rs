// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Number registry collaborator for inbound owner resolution.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{NumberFilter, OwnedNumber};

/// External registry of provisioned numbers and their owning customers.
#[async_trait]
pub trait NumberRegistry: Send + Sync {
    /// List registry entries matching the filter (exact match on a
    /// normalized number, optionally excluding soft-deleted entries).
    async fn list_numbers(
        &self,
        filter: &NumberFilter,
    ) -> Result<Vec<OwnedNumber>, CourierError>;
}
