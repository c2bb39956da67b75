// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process lifecycle event bus.
//!
//! Events flow over a tokio broadcast channel so any number of in-process
//! consumers (the gateway's future SSE surface, tests) can observe aggregate
//! lifecycle changes without coupling to the pipeline.

use async_trait::async_trait;
use courier_core::{CourierError, EventPublisher, EventType};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// One published lifecycle event.
#[derive(Debug, Clone)]
pub struct Event {
    pub customer_id: Uuid,
    pub event_type: EventType,
    pub payload: serde_json::Value,
}

/// [`EventPublisher`] backed by a broadcast channel.
///
/// Publishing with no live subscribers is not an error; the event is simply
/// dropped, matching fire-and-forget bus semantics.
pub struct BroadcastPublisher {
    tx: broadcast::Sender<Event>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// A new subscription receiving every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(
        &self,
        customer_id: Uuid,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> Result<(), CourierError> {
        let event = Event {
            customer_id,
            event_type,
            payload,
        };
        if self.tx.send(event).is_err() {
            debug!(%customer_id, %event_type, "no event subscribers, dropping");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();

        let customer_id = Uuid::new_v4();
        publisher
            .publish(customer_id, EventType::Created, serde_json::json!({"id": "x"}))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.customer_id, customer_id);
        assert_eq!(event.event_type, EventType::Created);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::new(8);
        publisher
            .publish(Uuid::new_v4(), EventType::Deleted, serde_json::json!({}))
            .await
            .unwrap();
    }
}
