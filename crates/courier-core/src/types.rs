// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for the message aggregate and its collaborators.
//!
//! The [`Message`] aggregate and [`Target`] delivery state are shared across
//! the storage, dispatch, provider, and gateway crates. Timestamps use a
//! reserved far-future sentinel instead of nullable columns: a `tm_update` or
//! `tm_delete` equal to [`timestamp_sentinel`] means "not set".

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

static SENTINEL: LazyLock<DateTime<Utc>> = LazyLock::new(|| {
    DateTime::parse_from_rfc3339("9999-01-01T00:00:00Z")
        .expect("sentinel timestamp is a valid RFC 3339 literal")
        .with_timezone(&Utc)
});

/// The reserved "not set" timestamp (9999-01-01T00:00:00Z).
pub fn timestamp_sentinel() -> DateTime<Utc> {
    *SENTINEL
}

/// The kind of address a message endpoint uses. SMS traffic is telephone
/// numbers only, but the wire shape keeps the discriminant explicit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AddressKind {
    Tel,
}

/// A source or destination endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub kind: AddressKind,
    pub number: String,
}

impl Address {
    /// A telephone-number address.
    pub fn tel(number: impl Into<String>) -> Self {
        Self {
            kind: AddressKind::Tel,
            number: number.into(),
        }
    }
}

/// Message kind. Fixed to `sms` in this domain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageType {
    Sms,
}

/// Message flow direction. Immutable after creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
}

/// External carrier integrations capable of accepting a send.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderName {
    Telnyx,
    Messagebird,
}

/// Per-destination delivery state.
///
/// Outbound targets start at `Queued` and move through `Sent`/`Failed`/
/// `GwTimeout`/`DlrTimeout`, optionally refined to `Delivered` by a delivery
/// receipt. Inbound targets start directly at `Received`. Only the status
/// reconciler mutates this field after creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetStatus {
    Queued,
    Sent,
    Failed,
    GwTimeout,
    DlrTimeout,
    Delivered,
    Received,
}

/// Lifecycle event kinds published for the message aggregate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Created,
    Updated,
    Deleted,
}

/// One destination address plus its own delivery state within a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub destination: Address,
    pub status: TargetStatus,
    /// Provider-reported message segment count. Zero until a provider reports.
    pub parts: u32,
    pub tm_update: DateTime<Utc>,
}

impl Target {
    /// A freshly queued outbound target.
    pub fn queued(destination: Address) -> Self {
        Self {
            destination,
            status: TargetStatus::Queued,
            parts: 0,
            tm_update: Utc::now(),
        }
    }

    /// An inbound target, already received.
    pub fn received(destination: Address, parts: u32) -> Self {
        Self {
            destination,
            status: TargetStatus::Received,
            parts,
            tm_update: Utc::now(),
        }
    }
}

/// The message aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub source: Address,
    /// Ordered, non-empty for outbound messages.
    pub targets: Vec<Target>,
    /// The provider whose outcome was reconciled. None until reconciliation.
    pub provider_name: Option<ProviderName>,
    /// The provider-side identifier for the accepted send, when reported.
    pub provider_reference_id: Option<String>,
    pub text: String,
    /// Auxiliary attachment references. Empty for the SMS pipeline.
    pub medias: Vec<String>,
    pub direction: Direction,
    pub tm_create: DateTime<Utc>,
    pub tm_update: DateTime<Utc>,
    pub tm_delete: DateTime<Utc>,
}

impl Message {
    /// Whether the aggregate has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.tm_delete != timestamp_sentinel()
    }
}

/// Exact-match predicates accepted by the message list operation.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageFilter {
    CustomerId(Uuid),
    Deleted(bool),
    Direction(Direction),
    ProviderName(ProviderName),
}

/// The result of a provider accepting (or reporting on) a send.
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    /// Input targets with provider-reported status and segment counts applied.
    pub targets: Vec<Target>,
    /// Provider-side message identifier, when the provider reports one.
    pub reference_id: Option<String>,
}

/// A provider-specific inbound callback normalized into the aggregate shape.
///
/// Hook parsers produce this; the inbound processor resolves the owning
/// customer and creates the message. Ack-only callbacks produce no value at
/// all (the parser returns `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct InboundSms {
    pub source: Address,
    /// Destinations with status `Received`, order as reported.
    pub targets: Vec<Target>,
    pub text: String,
}

/// A number registry entry mapping a provisioned number to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedNumber {
    pub number: String,
    pub customer_id: Uuid,
}

/// Lookup filter for the number registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFilter {
    /// Normalized number to match exactly.
    pub number: String,
    /// Skip soft-deleted registry entries.
    pub exclude_deleted: bool,
}

/// Normalize a phone number for registry lookup: strip separators and
/// whitespace, keep a single leading `+`.
pub fn normalize_number(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if raw.trim_start().starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_far_future() {
        let s = timestamp_sentinel();
        assert!(s > Utc::now());
        assert_eq!(s.to_rfc3339(), "9999-01-01T00:00:00+00:00");
    }

    #[test]
    fn queued_target_has_zero_parts() {
        let t = Target::queued(Address::tel("+821100000002"));
        assert_eq!(t.status, TargetStatus::Queued);
        assert_eq!(t.parts, 0);
    }

    #[test]
    fn message_deleted_predicate() {
        let mut msg = Message {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            message_type: MessageType::Sms,
            source: Address::tel("+821100000001"),
            targets: vec![Target::queued(Address::tel("+821100000002"))],
            provider_name: None,
            provider_reference_id: None,
            text: "hi".into(),
            medias: vec![],
            direction: Direction::Outbound,
            tm_create: Utc::now(),
            tm_update: timestamp_sentinel(),
            tm_delete: timestamp_sentinel(),
        };
        assert!(!msg.is_deleted());
        msg.tm_delete = Utc::now();
        assert!(msg.is_deleted());
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&TargetStatus::GwTimeout).unwrap(),
            "\"gw_timeout\""
        );
        assert_eq!(
            serde_json::to_string(&ProviderName::Messagebird).unwrap(),
            "\"messagebird\""
        );
        assert_eq!(
            serde_json::to_string(&Direction::Inbound).unwrap(),
            "\"inbound\""
        );
    }

    #[test]
    fn message_round_trips_through_json() {
        let msg = Message {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            message_type: MessageType::Sms,
            source: Address::tel("+821100000001"),
            targets: vec![Target::queued(Address::tel("+821100000002"))],
            provider_name: Some(ProviderName::Telnyx),
            provider_reference_id: Some("6b79e50e426c4d64ac45345bae84fe55".into()),
            text: "Hello, this is test message.".into(),
            medias: vec![],
            direction: Direction::Outbound,
            tm_create: Utc::now(),
            tm_update: timestamp_sentinel(),
            tm_delete: timestamp_sentinel(),
        };
        let json = serde_json::to_vec(&msg).unwrap();
        let back: Message = serde_json::from_slice(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize_number("+82 11-0000-0001"), "+821100000001");
        assert_eq!(normalize_number("0211234567"), "0211234567");
        assert_eq!(normalize_number(" +1 (555) 000-1234"), "+15550001234");
    }
}
