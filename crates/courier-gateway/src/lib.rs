// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Courier dispatch service.
//!
//! An axum router exposing the message REST API, provider webhook intake,
//! and unauthenticated health/metrics endpoints.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, router, start_server};
