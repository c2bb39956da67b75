// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the Courier dispatch pipeline.
//!
//! Everything the core consumes from the outside world sits behind one of
//! these traits: carrier providers, the balance service, the number registry,
//! the event bus, the key-value cache, and the metrics sink. All async traits
//! use `#[async_trait]` for dynamic dispatch compatibility.

pub mod balance;
pub mod cache;
pub mod events;
pub mod metrics;
pub mod numbers;
pub mod provider;

// Re-export all traits at the traits module level for convenience.
pub use balance::BalanceService;
pub use cache::KvCache;
pub use events::EventPublisher;
pub use metrics::MetricsSink;
pub use numbers::NumberRegistry;
pub use provider::SmsProvider;
