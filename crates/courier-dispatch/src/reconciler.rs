// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status reconciliation after a provider accepts a send.

use std::sync::Arc;

use courier_core::{CourierError, EventPublisher, EventType, Message, ProviderName, Target};
use courier_storage::{MessageStore, MessageUpdate};
use tracing::info;
use uuid::Uuid;

/// Writes a provider's outcome back onto the aggregate and announces it.
///
/// The write and the announcement are not atomic: if the durable update
/// succeeds but the canonical re-fetch fails, this returns an error and the
/// `updated` event is never published. The aggregate itself is still correct;
/// only the notification is lost.
pub struct StatusReconciler {
    store: Arc<MessageStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl StatusReconciler {
    pub fn new(store: Arc<MessageStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Record which provider took the message, its reference id, and the
    /// provider-reported target states, then publish `updated` with the
    /// canonical post-write aggregate.
    pub async fn reconcile(
        &self,
        id: Uuid,
        provider: ProviderName,
        reference_id: Option<String>,
        targets: Vec<Target>,
    ) -> Result<Message, CourierError> {
        self.store
            .update(
                id,
                MessageUpdate {
                    provider_name: Some(provider),
                    provider_reference_id: reference_id,
                    targets: Some(targets),
                },
            )
            .await?;

        let msg = self.store.get(id).await?;
        self.publisher
            .publish(
                msg.customer_id,
                EventType::Updated,
                serde_json::to_value(&msg)
                    .map_err(|e| CourierError::Internal(format!("serialize message: {e}")))?,
            )
            .await?;

        info!(%id, provider = %provider, "message reconciled");
        Ok(msg)
    }
}
