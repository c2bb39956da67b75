// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier's dispatch pipeline: outbound orchestration, status
//! reconciliation, inbound hook processing, and the in-process event bus.

pub mod events;
pub mod hook;
pub mod orchestrator;
pub mod reconciler;

pub use events::{BroadcastPublisher, Event};
pub use hook::InboundHookProcessor;
pub use orchestrator::DeliveryOrchestrator;
pub use reconciler::StatusReconciler;
