// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle event publication collaborator.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CourierError;
use crate::types::EventType;

/// Publishes aggregate lifecycle events (`created`, `updated`, `deleted`)
/// carrying the full message projection as JSON.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        customer_id: Uuid,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> Result<(), CourierError>;
}
