// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier dispatch service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// HTTP gateway settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Provider fallback settings.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Telnyx carrier integration settings.
    #[serde(default)]
    pub telnyx: TelnyxConfig,

    /// MessageBird carrier integration settings.
    #[serde(default)]
    pub messagebird: MessageBirdConfig,

    /// Provisioned-number registry entries for inbound owner resolution.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Balance validation settings.
    #[serde(default)]
    pub balance: BalanceConfig,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address for the gateway.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the gateway.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "courier.db".to_string()
}

/// Provider fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Carrier names in fallback order. The first provider is always tried
    /// first; later entries only see messages the earlier ones rejected.
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            priority: default_priority(),
        }
    }
}

fn default_priority() -> Vec<String> {
    vec!["telnyx".to_string(), "messagebird".to_string()]
}

/// Telnyx carrier integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelnyxConfig {
    /// Whether the Telnyx adapter is wired into the fallback chain.
    #[serde(default)]
    pub enabled: bool,

    /// API key (v2 bearer token).
    #[serde(default)]
    pub api_key: String,

    /// Messaging profile to send through, when the account has several.
    #[serde(default)]
    pub messaging_profile_id: Option<String>,

    /// API base URL override (sandbox environments).
    #[serde(default)]
    pub base_url: Option<String>,
}

/// MessageBird carrier integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessageBirdConfig {
    /// Whether the MessageBird adapter is wired into the fallback chain.
    #[serde(default)]
    pub enabled: bool,

    /// Live access key.
    #[serde(default)]
    pub access_key: String,

    /// API base URL override (sandbox environments).
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Provisioned-number registry configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Static number-to-customer entries.
    #[serde(default)]
    pub numbers: Vec<RegistryEntry>,
}

/// One provisioned number and its owning customer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryEntry {
    pub number: String,
    pub customer_id: Uuid,
}

/// Balance validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BalanceConfig {
    /// When true, every balance check passes. Standalone deployments without
    /// a billing backend run permissive.
    #[serde(default = "default_permissive")]
    pub permissive: bool,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            permissive: default_permissive(),
        }
    }
}

fn default_permissive() -> bool {
    true
}
