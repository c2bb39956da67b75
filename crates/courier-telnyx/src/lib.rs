// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telnyx carrier integration.
//!
//! [`TelnyxClient`] sends an entire message batch in one API call and maps the
//! per-recipient receipts back onto the message's targets. [`hook::parse`]
//! normalizes Telnyx webhook callbacks into the provider-neutral inbound
//! shape.

pub mod client;
pub mod hook;

pub use client::TelnyxClient;
