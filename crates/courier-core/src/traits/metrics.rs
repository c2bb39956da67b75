// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metrics sink capability.
//!
//! Provider adapters and the dispatch pipeline count deliveries, exhausted
//! fallbacks, and cache staleness through this injected sink rather than a
//! process-global counter, so unit tests stay side-effect-free.

/// Sink for monotonically increasing counters.
pub trait MetricsSink: Send + Sync {
    /// Increment `name` by one, tagged with `labels`.
    fn incr_counter(&self, name: &'static str, labels: &[(&'static str, String)]);
}
