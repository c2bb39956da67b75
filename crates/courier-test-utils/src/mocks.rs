// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Simple in-memory collaborators: balance, number registry, event capture,
//! metrics sink.

use std::sync::Mutex;

use async_trait::async_trait;
use courier_core::{
    BalanceService, BillingReference, CourierError, EventPublisher, EventType, MetricsSink,
    NumberFilter, NumberRegistry, OwnedNumber,
};
use uuid::Uuid;

/// Balance service with a fixed answer.
pub struct MockBalance(pub bool);

#[async_trait]
impl BalanceService for MockBalance {
    async fn is_valid_balance(
        &self,
        _customer_id: Uuid,
        _reference_type: BillingReference,
        _sub_reference: &str,
        _unit_count: usize,
    ) -> Result<bool, CourierError> {
        Ok(self.0)
    }
}

/// Number registry backed by a fixed entry list.
pub struct MockRegistry {
    entries: Vec<OwnedNumber>,
}

impl MockRegistry {
    pub fn new(entries: Vec<OwnedNumber>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl NumberRegistry for MockRegistry {
    async fn list_numbers(
        &self,
        filter: &NumberFilter,
    ) -> Result<Vec<OwnedNumber>, CourierError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.number == filter.number)
            .cloned()
            .collect())
    }
}

/// Event publisher that records everything it is asked to publish.
#[derive(Default)]
pub struct CapturingPublisher {
    events: Mutex<Vec<(Uuid, EventType, serde_json::Value)>>,
}

impl CapturingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Uuid, EventType, serde_json::Value)> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.events.lock().unwrap().iter().map(|e| e.1).collect()
    }
}

#[async_trait]
impl EventPublisher for CapturingPublisher {
    async fn publish(
        &self,
        customer_id: Uuid,
        event_type: EventType,
        payload: serde_json::Value,
    ) -> Result<(), CourierError> {
        self.events
            .lock()
            .unwrap()
            .push((customer_id, event_type, payload));
        Ok(())
    }
}

/// Metrics sink that discards everything.
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn incr_counter(&self, _name: &'static str, _labels: &[(&'static str, String)]) {}
}
