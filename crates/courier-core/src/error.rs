// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier dispatch service.

use thiserror::Error;

/// The primary error type used across all Courier collaborator traits and
/// core operations.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Request validation errors (missing required field, zero destinations).
    #[error("validation error: {0}")]
    Validation(String),

    /// The customer's balance cannot cover the requested number of billable units.
    #[error("insufficient balance for customer {customer_id}: {units} units requested")]
    InsufficientBalance { customer_id: uuid::Uuid, units: usize },

    /// The requested message does not exist.
    #[error("message not found: {0}")]
    NotFound(uuid::Uuid),

    /// No active registry entry owns the given number.
    #[error("no registered owner for number {0}")]
    NumberNotFound(String),

    /// More than one active registry entry owns the given number.
    #[error("number {number} resolves to {matches} active owners")]
    AmbiguousNumber { number: String, matches: usize },

    /// No hook parser or adapter is registered for the given provider suffix.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Inbound payloads that cannot be parsed into the aggregate shape.
    #[error("malformed hook payload: {0}")]
    Hook(String),

    /// Durable store errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Key-value cache errors. Swallowed on refresh paths, surfaced on none.
    #[error("cache error: {0}")]
    Cache(String),

    /// Provider transport or API errors (HTTP failure, rejected batch).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Lifecycle event publication failures.
    #[error("event publish error: {0}")]
    Publish(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
