// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery orchestration.
//!
//! The orchestrator validates and persists an outbound message synchronously,
//! then hands provider dispatch to a tracked background task and returns the
//! queued aggregate immediately. Dispatch walks the configured provider list
//! in order, falling through on any provider error, and reconciles the first
//! acceptance back onto the aggregate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use courier_core::{
    Address, BalanceService, BillingReference, CourierError, Direction, EventPublisher,
    EventType, Message, MessageFilter, MessageType, MetricsSink, SmsProvider, Target,
    timestamp_sentinel,
};
use courier_storage::MessageStore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use uuid::Uuid;

use crate::reconciler::StatusReconciler;

const DISPATCH_EXHAUSTED: &str = "courier_dispatch_exhausted_total";

/// Orchestrates the outbound send pipeline.
pub struct DeliveryOrchestrator {
    store: Arc<MessageStore>,
    balance: Arc<dyn BalanceService>,
    /// Fallback order is this list's order.
    providers: Vec<Arc<dyn SmsProvider>>,
    reconciler: Arc<StatusReconciler>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<dyn MetricsSink>,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl DeliveryOrchestrator {
    pub fn new(
        store: Arc<MessageStore>,
        balance: Arc<dyn BalanceService>,
        providers: Vec<Arc<dyn SmsProvider>>,
        reconciler: Arc<StatusReconciler>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<dyn MetricsSink>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            balance,
            providers,
            reconciler,
            publisher,
            metrics,
            tasks: TaskTracker::new(),
            shutdown,
        }
    }

    /// Accept an outbound message: validate, check balance, persist as
    /// `Queued`, publish `created`, and dispatch in the background.
    ///
    /// Returns the persisted aggregate in its queued state; the provider
    /// outcome lands later through the reconciler.
    pub async fn send(
        &self,
        customer_id: Uuid,
        source: Address,
        destinations: Vec<Address>,
        text: String,
    ) -> Result<Message, CourierError> {
        if destinations.is_empty() {
            return Err(CourierError::Validation(
                "at least one destination is required".into(),
            ));
        }
        if text.is_empty() {
            return Err(CourierError::Validation("text must not be empty".into()));
        }

        let id = Uuid::new_v4();
        let ok = self
            .balance
            .is_valid_balance(
                customer_id,
                BillingReference::Sms,
                &id.to_string(),
                destinations.len(),
            )
            .await?;
        if !ok {
            return Err(CourierError::InsufficientBalance {
                customer_id,
                units: destinations.len(),
            });
        }

        let msg = Message {
            id,
            customer_id,
            message_type: MessageType::Sms,
            source,
            targets: destinations.into_iter().map(Target::queued).collect(),
            provider_name: None,
            provider_reference_id: None,
            text,
            medias: vec![],
            direction: Direction::Outbound,
            tm_create: Utc::now(),
            tm_update: timestamp_sentinel(),
            tm_delete: timestamp_sentinel(),
        };
        let msg = self.store.create(msg).await?;

        self.publish_best_effort(&msg, EventType::Created).await;

        let providers = self.providers.clone();
        let reconciler = self.reconciler.clone();
        let metrics = self.metrics.clone();
        let token = self.shutdown.child_token();
        let dispatched = msg.clone();
        self.tasks.spawn(async move {
            // Checked only before dispatch begins: once a provider call is in
            // flight it runs to completion so drain() can reconcile the
            // outcome instead of abandoning an accepted message.
            if token.is_cancelled() {
                warn!(id = %dispatched.id, "shutdown before dispatch, message stays queued");
                return;
            }
            dispatch(dispatched, providers, reconciler, metrics).await;
        });

        Ok(msg)
    }

    /// Fetch one message by id.
    pub async fn get(&self, id: Uuid) -> Result<Message, CourierError> {
        self.store.get(id).await
    }

    /// List messages created strictly before `token`, newest first.
    pub async fn list(
        &self,
        token: Option<DateTime<Utc>>,
        limit: u64,
        filters: &[MessageFilter],
    ) -> Result<Vec<Message>, CourierError> {
        self.store.list(token, limit, filters).await
    }

    /// Soft-delete a message and publish `deleted`.
    pub async fn delete(&self, id: Uuid) -> Result<Message, CourierError> {
        let msg = self.store.delete(id).await?;
        self.publish_best_effort(&msg, EventType::Deleted).await;
        Ok(msg)
    }

    /// Stop accepting new dispatch tasks and wait for in-flight ones.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    async fn publish_best_effort(&self, msg: &Message, event_type: EventType) {
        let payload = match serde_json::to_value(msg) {
            Ok(v) => v,
            Err(e) => {
                warn!(id = %msg.id, error = %e, "failed to serialize event payload");
                return;
            }
        };
        if let Err(e) = self
            .publisher
            .publish(msg.customer_id, event_type, payload)
            .await
        {
            warn!(id = %msg.id, %event_type, error = %e, "event publish failed");
        }
    }
}

/// Walk the provider list in order until one accepts the message.
async fn dispatch(
    msg: Message,
    providers: Vec<Arc<dyn SmsProvider>>,
    reconciler: Arc<StatusReconciler>,
    metrics: Arc<dyn MetricsSink>,
) {
    for provider in &providers {
        let name = provider.name();
        match provider
            .send_message(msg.id, &msg.source, &msg.targets, &msg.text)
            .await
        {
            Ok(outcome) => {
                info!(id = %msg.id, provider = %name, "provider accepted message");
                if let Err(e) = reconciler
                    .reconcile(msg.id, name, outcome.reference_id, outcome.targets)
                    .await
                {
                    warn!(id = %msg.id, provider = %name, error = %e, "reconcile failed");
                }
                return;
            }
            Err(e) => {
                warn!(id = %msg.id, provider = %name, error = %e, "provider rejected message, trying next");
            }
        }
    }

    warn!(id = %msg.id, tried = providers.len(), "all providers failed, message stays queued");
    metrics.incr_counter(DISPATCH_EXHAUSTED, &[("type", "sms".into())]);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use courier_core::{ProviderName, SendOutcome, TargetStatus};
    use courier_storage::{Database, MemoryCache};
    use courier_test_utils::{
        CapturingPublisher, MockBalance, MockProvider, NoopSink, ScriptedSend,
    };

    /// Provider that stalls mid-call before accepting, modelling a send
    /// that is in flight when shutdown hits.
    struct SlowProvider {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl SmsProvider for SlowProvider {
        fn name(&self) -> ProviderName {
            ProviderName::Telnyx
        }

        async fn send_message(
            &self,
            _message_id: Uuid,
            _source: &Address,
            targets: &[Target],
            _text: &str,
        ) -> Result<SendOutcome, CourierError> {
            tokio::time::sleep(self.delay).await;
            let mut targets = targets.to_vec();
            for target in &mut targets {
                target.status = TargetStatus::Sent;
                target.parts = 1;
            }
            Ok(SendOutcome {
                targets,
                reference_id: Some("slow-ref".into()),
            })
        }
    }

    struct Fixture {
        orchestrator: DeliveryOrchestrator,
        store: Arc<MessageStore>,
        publisher: Arc<CapturingPublisher>,
        telnyx: Arc<MockProvider>,
        messagebird: Arc<MockProvider>,
    }

    async fn fixture(balance_ok: bool, providers: Vec<Arc<MockProvider>>) -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(MessageStore::new(
            db,
            Arc::new(MemoryCache::new()),
            Arc::new(NoopSink),
        ));
        let publisher = Arc::new(CapturingPublisher::new());
        let reconciler = Arc::new(StatusReconciler::new(store.clone(), publisher.clone()));

        let telnyx = providers
            .first()
            .cloned()
            .unwrap_or_else(|| Arc::new(MockProvider::new(ProviderName::Telnyx)));
        let messagebird = providers
            .get(1)
            .cloned()
            .unwrap_or_else(|| Arc::new(MockProvider::new(ProviderName::Messagebird)));

        let orchestrator = DeliveryOrchestrator::new(
            store.clone(),
            Arc::new(MockBalance(balance_ok)),
            vec![telnyx.clone(), messagebird.clone()],
            reconciler,
            publisher.clone(),
            Arc::new(NoopSink),
            CancellationToken::new(),
        );

        Fixture {
            orchestrator,
            store,
            publisher,
            telnyx,
            messagebird,
        }
    }

    fn destinations(n: usize) -> Vec<Address> {
        (0..n)
            .map(|i| Address::tel(format!("+8211000000{i:02}")))
            .collect()
    }

    #[tokio::test]
    async fn send_persists_queued_and_reconciles_first_acceptance() {
        let telnyx = Arc::new(MockProvider::new(ProviderName::Telnyx));
        telnyx.push(ScriptedSend::Accept {
            status: TargetStatus::Sent,
            parts: 1,
            reference_id: Some("ref-1".into()),
        });
        let f = fixture(true, vec![telnyx]).await;

        let msg = f
            .orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                destinations(2),
                "hello".into(),
            )
            .await
            .unwrap();
        assert!(msg.targets.iter().all(|t| t.status == TargetStatus::Queued));
        assert!(msg.provider_name.is_none());

        f.orchestrator.drain().await;

        let stored = f.store.get(msg.id).await.unwrap();
        assert_eq!(stored.provider_name, Some(ProviderName::Telnyx));
        assert_eq!(stored.provider_reference_id.as_deref(), Some("ref-1"));
        assert_eq!(stored.targets.len(), 2);
        assert!(stored.targets.iter().all(|t| t.status == TargetStatus::Sent));

        assert_eq!(
            f.publisher.event_types(),
            vec![EventType::Created, EventType::Updated]
        );
        assert_eq!(f.telnyx.call_count(), 1);
        assert_eq!(f.messagebird.call_count(), 0);
    }

    #[tokio::test]
    async fn first_provider_failure_falls_through_in_order() {
        let telnyx = Arc::new(MockProvider::failing(ProviderName::Telnyx, "carrier down"));
        let messagebird = Arc::new(MockProvider::new(ProviderName::Messagebird));
        messagebird.push(ScriptedSend::Accept {
            status: TargetStatus::Sent,
            parts: 1,
            reference_id: Some("mb-ref".into()),
        });
        let f = fixture(true, vec![telnyx, messagebird]).await;

        let msg = f
            .orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                destinations(1),
                "hello".into(),
            )
            .await
            .unwrap();
        f.orchestrator.drain().await;

        let stored = f.store.get(msg.id).await.unwrap();
        assert_eq!(stored.provider_name, Some(ProviderName::Messagebird));
        assert_eq!(f.telnyx.call_count(), 1);
        assert_eq!(f.messagebird.call_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_providers_leave_message_queued_with_no_updated_event() {
        let telnyx = Arc::new(MockProvider::failing(ProviderName::Telnyx, "down"));
        let messagebird =
            Arc::new(MockProvider::failing(ProviderName::Messagebird, "also down"));
        let f = fixture(true, vec![telnyx, messagebird]).await;

        let msg = f
            .orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                destinations(1),
                "hello".into(),
            )
            .await
            .unwrap();
        f.orchestrator.drain().await;

        let stored = f.store.get(msg.id).await.unwrap();
        assert!(stored.provider_name.is_none());
        assert!(stored.targets.iter().all(|t| t.status == TargetStatus::Queued));
        // created only; no updated event for a message no provider took
        assert_eq!(f.publisher.event_types(), vec![EventType::Created]);
    }

    #[tokio::test]
    async fn insufficient_balance_persists_nothing() {
        let f = fixture(false, vec![]).await;

        let err = f
            .orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                destinations(3),
                "hello".into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourierError::InsufficientBalance { units: 3, .. }
        ));

        let listed = f.orchestrator.list(None, 10, &[]).await.unwrap();
        assert!(listed.is_empty());
        assert!(f.publisher.events().is_empty());
        assert_eq!(f.telnyx.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_destinations_and_text_are_rejected() {
        let f = fixture(true, vec![]).await;

        let err = f
            .orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                vec![],
                "hello".into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Validation(_)));

        let err = f
            .orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                destinations(1),
                String::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Validation(_)));
    }

    #[tokio::test]
    async fn target_order_follows_request_order() {
        let telnyx = Arc::new(MockProvider::new(ProviderName::Telnyx));
        let f = fixture(true, vec![telnyx]).await;

        let dests = destinations(3);
        let msg = f
            .orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                dests.clone(),
                "hello".into(),
            )
            .await
            .unwrap();
        f.orchestrator.drain().await;

        let stored = f.store.get(msg.id).await.unwrap();
        assert_eq!(stored.targets.len(), 3);
        for (target, dest) in stored.targets.iter().zip(&dests) {
            assert_eq!(&target.destination, dest);
        }
    }

    #[tokio::test]
    async fn delete_publishes_deleted_event() {
        let f = fixture(true, vec![]).await;

        let msg = f
            .orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                destinations(1),
                "hello".into(),
            )
            .await
            .unwrap();
        f.orchestrator.drain().await;

        let deleted = f.orchestrator.delete(msg.id).await.unwrap();
        assert!(deleted.is_deleted());
        assert!(f.publisher.event_types().contains(&EventType::Deleted));
    }

    #[tokio::test]
    async fn cancelled_shutdown_token_skips_dispatch() {
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(MessageStore::new(
            db,
            Arc::new(MemoryCache::new()),
            Arc::new(NoopSink),
        ));
        let publisher = Arc::new(CapturingPublisher::new());
        let reconciler = Arc::new(StatusReconciler::new(store.clone(), publisher.clone()));
        let telnyx = Arc::new(MockProvider::new(ProviderName::Telnyx));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let orchestrator = DeliveryOrchestrator::new(
            store.clone(),
            Arc::new(MockBalance(true)),
            vec![telnyx.clone()],
            reconciler,
            publisher,
            Arc::new(NoopSink),
            shutdown,
        );

        let msg = orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                destinations(1),
                "hello".into(),
            )
            .await
            .unwrap();
        orchestrator.drain().await;

        // Dispatch never ran; the message survives in its queued state.
        assert_eq!(telnyx.call_count(), 0);
        let stored = store.get(msg.id).await.unwrap();
        assert!(stored.targets.iter().all(|t| t.status == TargetStatus::Queued));
    }

    #[tokio::test]
    async fn shutdown_mid_dispatch_drains_to_completion() {
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(MessageStore::new(
            db,
            Arc::new(MemoryCache::new()),
            Arc::new(NoopSink),
        ));
        let publisher = Arc::new(CapturingPublisher::new());
        let reconciler = Arc::new(StatusReconciler::new(store.clone(), publisher.clone()));
        let shutdown = CancellationToken::new();

        let orchestrator = DeliveryOrchestrator::new(
            store.clone(),
            Arc::new(MockBalance(true)),
            vec![Arc::new(SlowProvider {
                delay: Duration::from_millis(200),
            })],
            reconciler,
            publisher,
            Arc::new(NoopSink),
            shutdown.clone(),
        );

        let msg = orchestrator
            .send(
                Uuid::new_v4(),
                Address::tel("+821100000001"),
                destinations(1),
                "hello".into(),
            )
            .await
            .unwrap();

        // Let the background task enter the provider call, then cancel.
        // The started dispatch must run to completion and reconcile.
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        orchestrator.drain().await;

        let stored = store.get(msg.id).await.unwrap();
        assert_eq!(stored.provider_name, Some(ProviderName::Telnyx));
        assert_eq!(stored.provider_reference_id.as_deref(), Some("slow-ref"));
        assert!(stored.targets.iter().all(|t| t.status == TargetStatus::Sent));
    }
}
