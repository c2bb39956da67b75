// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MessageBird carrier integration.
//!
//! [`MessageBirdClient`] fans a message out as one concurrent API call per
//! destination and collects the results behind a full barrier. [`hook::parse`]
//! normalizes MessageBird webhook callbacks into the provider-neutral inbound
//! shape.

pub mod client;
pub mod hook;

pub use client::MessageBirdClient;
