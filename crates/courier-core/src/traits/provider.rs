// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for external carrier integrations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CourierError;
use crate::types::{Address, ProviderName, SendOutcome, Target};

/// Adapter capable of accepting a text message for one or more destinations
/// via one external carrier integration.
///
/// Two implementation shapes satisfy this contract:
///
/// - **batch**: one network call carrying all destinations; the provider's
///   per-recipient receipts are mapped back onto the input targets by
///   destination address. A transport error fails the entire call with no
///   partial target information.
/// - **fan-out**: one independent network call per destination, issued
///   concurrently and joined with a full barrier. If any per-destination
///   call errors, the whole call errors and partial successes are discarded,
///   so the orchestrator can fall back to the next provider with the full
///   target list.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// The carrier this adapter integrates with.
    fn name(&self) -> ProviderName;

    /// Send `text` from `source` to every destination in `targets`.
    ///
    /// On success, returns the input targets with provider-reported status
    /// and segment counts applied, plus the provider-side reference id.
    async fn send_message(
        &self,
        message_id: Uuid,
        source: &Address,
        targets: &[Target],
        text: &str,
    ) -> Result<SendOutcome, CourierError>;
}
