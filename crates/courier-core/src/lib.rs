// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier SMS dispatch service.
//!
//! This crate provides the domain types (the message aggregate and its
//! per-destination delivery state), the error type, and the collaborator
//! traits the dispatch pipeline consumes. Storage, provider, dispatch, and
//! gateway crates all depend on this one and nothing else in the workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use types::{
    Address, AddressKind, Direction, EventType, InboundSms, Message, MessageFilter,
    MessageType, NumberFilter, OwnedNumber, ProviderName, SendOutcome, Target, TargetStatus,
    normalize_number, timestamp_sentinel,
};

pub use traits::{
    BalanceService, EventPublisher, KvCache, MetricsSink, NumberRegistry, SmsProvider,
};
pub use traits::balance::BillingReference;
