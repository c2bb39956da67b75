// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Balance validation collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::CourierError;

/// Billing reference kinds a balance check can be scoped to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BillingReference {
    Sms,
}

/// External balance/billing service consulted before any outbound send is
/// persisted.
#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Whether `customer_id` can cover `unit_count` billable units of the
    /// given reference type.
    async fn is_valid_balance(
        &self,
        customer_id: Uuid,
        reference_type: BillingReference,
        sub_reference: &str,
        unit_count: usize,
    ) -> Result<bool, CourierError>;
}
