// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook processing.
//!
//! Provider callbacks arrive at a per-provider URL suffix. The matching
//! parser normalizes the body into the provider-neutral inbound shape (or
//! reports an ack-only event), the number registry resolves the owning
//! customer from the first destination, and the resulting inbound message is
//! persisted and announced.

use std::sync::Arc;

use courier_core::{
    CourierError, Direction, EventPublisher, EventType, InboundSms, Message, MessageType,
    NumberFilter, NumberRegistry, ProviderName, normalize_number, timestamp_sentinel,
};
use courier_storage::MessageStore;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

/// Turns raw provider callbacks into inbound messages.
pub struct InboundHookProcessor {
    store: Arc<MessageStore>,
    registry: Arc<dyn NumberRegistry>,
    publisher: Arc<dyn EventPublisher>,
}

impl InboundHookProcessor {
    pub fn new(
        store: Arc<MessageStore>,
        registry: Arc<dyn NumberRegistry>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            registry,
            publisher,
        }
    }

    /// Process one raw webhook body for the provider named by the URL
    /// suffix. Returns `Ok(None)` for acknowledged-but-ignored callbacks.
    pub async fn process(
        &self,
        provider_suffix: &str,
        raw: &[u8],
    ) -> Result<Option<Message>, CourierError> {
        let (provider, inbound) = match provider_suffix {
            "telnyx" => (ProviderName::Telnyx, courier_telnyx::hook::parse(raw)?),
            "messagebird" => (
                ProviderName::Messagebird,
                courier_messagebird::hook::parse(raw)?,
            ),
            other => return Err(CourierError::UnknownProvider(other.to_string())),
        };

        let Some(inbound) = inbound else {
            return Ok(None);
        };

        let msg = self.create_inbound(provider, inbound).await?;
        Ok(Some(msg))
    }

    async fn create_inbound(
        &self,
        provider: ProviderName,
        inbound: InboundSms,
    ) -> Result<Message, CourierError> {
        // Owner resolution keys off the first destination: that is the
        // provisioned number the handset replied to.
        let first = inbound
            .targets
            .first()
            .ok_or_else(|| CourierError::Hook("inbound message has no targets".into()))?;
        let number = normalize_number(&first.destination.number);

        let owners = self
            .registry
            .list_numbers(&NumberFilter {
                number: number.clone(),
                exclude_deleted: true,
            })
            .await?;
        let owner = match owners.as_slice() {
            [] => return Err(CourierError::NumberNotFound(number)),
            [one] => one,
            many => {
                // Silently picking the first registration would misattribute
                // traffic, so multiple owners is an explicit refusal.
                return Err(CourierError::AmbiguousNumber {
                    number,
                    matches: many.len(),
                });
            }
        };

        let msg = Message {
            id: Uuid::new_v4(),
            customer_id: owner.customer_id,
            message_type: MessageType::Sms,
            source: inbound.source,
            targets: inbound.targets,
            provider_name: Some(provider),
            provider_reference_id: None,
            text: inbound.text,
            medias: vec![],
            direction: Direction::Inbound,
            tm_create: Utc::now(),
            tm_update: timestamp_sentinel(),
            tm_delete: timestamp_sentinel(),
        };
        let msg = self.store.create(msg).await?;

        match serde_json::to_value(&msg) {
            Ok(payload) => {
                if let Err(e) = self
                    .publisher
                    .publish(msg.customer_id, EventType::Created, payload)
                    .await
                {
                    warn!(id = %msg.id, error = %e, "inbound created event publish failed");
                }
            }
            Err(e) => warn!(id = %msg.id, error = %e, "failed to serialize event payload"),
        }

        info!(id = %msg.id, provider = %provider, "inbound message created");
        Ok(msg)
    }
}
