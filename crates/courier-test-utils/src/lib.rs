// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted in-memory collaborators for pipeline tests.
//!
//! These mocks implement the core collaborator traits without any network or
//! process-global state, so dispatch and gateway tests can script provider
//! outcomes and assert on observed calls.

pub mod mock_provider;
pub mod mocks;

pub use mock_provider::{MockProvider, ScriptedSend};
pub use mocks::{CapturingPublisher, MockBalance, MockRegistry, NoopSink};
