// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config-backed implementations of the external collaborator seams.
//!
//! Standalone deployments have no billing backend and no dynamic number
//! inventory, so the balance service and number registry are wired straight
//! from configuration.

use async_trait::async_trait;
use courier_core::{
    BalanceService, BillingReference, CourierError, NumberFilter, NumberRegistry, OwnedNumber,
    normalize_number,
};
use courier_config::model::RegistryConfig;
use tracing::warn;
use uuid::Uuid;

/// Balance service with a fixed policy from configuration.
///
/// Permissive mode approves every check. Non-permissive mode refuses every
/// send until a real billing backend is wired in, failing closed rather than
/// accruing unbillable traffic.
pub struct ConfigBalance {
    permissive: bool,
}

impl ConfigBalance {
    pub fn new(permissive: bool) -> Self {
        if !permissive {
            warn!("balance checks are non-permissive; all outbound sends will be refused");
        }
        Self { permissive }
    }
}

#[async_trait]
impl BalanceService for ConfigBalance {
    async fn is_valid_balance(
        &self,
        _customer_id: Uuid,
        _reference_type: BillingReference,
        _sub_reference: &str,
        _unit_count: usize,
    ) -> Result<bool, CourierError> {
        Ok(self.permissive)
    }
}

/// Number registry backed by the static `[registry]` config section.
///
/// Numbers are normalized once at load so inbound lookup is an exact match.
pub struct StaticNumberRegistry {
    entries: Vec<OwnedNumber>,
}

impl StaticNumberRegistry {
    pub fn from_config(config: &RegistryConfig) -> Self {
        let entries = config
            .numbers
            .iter()
            .map(|e| OwnedNumber {
                number: normalize_number(&e.number),
                customer_id: e.customer_id,
            })
            .collect();
        Self { entries }
    }
}

#[async_trait]
impl NumberRegistry for StaticNumberRegistry {
    async fn list_numbers(
        &self,
        filter: &NumberFilter,
    ) -> Result<Vec<OwnedNumber>, CourierError> {
        // Static entries are never soft-deleted; the flag only matters for
        // registries with a mutable backing store.
        Ok(self
            .entries
            .iter()
            .filter(|e| e.number == filter.number)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::model::RegistryEntry;

    #[tokio::test]
    async fn permissive_balance_approves() {
        let balance = ConfigBalance::new(true);
        let ok = balance
            .is_valid_balance(Uuid::new_v4(), BillingReference::Sms, "ref", 3)
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn non_permissive_balance_refuses() {
        let balance = ConfigBalance::new(false);
        let ok = balance
            .is_valid_balance(Uuid::new_v4(), BillingReference::Sms, "ref", 1)
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn registry_normalizes_configured_numbers() {
        let customer_id = Uuid::new_v4();
        let registry = StaticNumberRegistry::from_config(&RegistryConfig {
            numbers: vec![RegistryEntry {
                number: "+82 11-0000-0001".into(),
                customer_id,
            }],
        });

        let found = registry
            .list_numbers(&NumberFilter {
                number: "+821100000001".into(),
                exclude_deleted: true,
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_id, customer_id);
    }
}
