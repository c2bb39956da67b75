// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted provider adapter.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use courier_core::{
    Address, CourierError, ProviderName, SendOutcome, SmsProvider, Target, TargetStatus,
};
use uuid::Uuid;

/// One scripted response for a [`MockProvider`] send call.
#[derive(Debug, Clone)]
pub enum ScriptedSend {
    /// Accept the send, reporting `status` and `parts` on every target.
    Accept {
        status: TargetStatus,
        parts: u32,
        reference_id: Option<String>,
    },
    /// Fail the send with a provider error carrying this message.
    Fail(String),
}

/// Provider adapter that replays a script of outcomes.
///
/// Each `send_message` call pops the next [`ScriptedSend`]; when the script
/// runs dry the default is accepting with status `Sent` and one part. Every
/// call is recorded for assertion.
pub struct MockProvider {
    name: ProviderName,
    script: Mutex<VecDeque<ScriptedSend>>,
    calls: Mutex<Vec<(Uuid, Address, Vec<Target>, String)>>,
}

impl MockProvider {
    pub fn new(name: ProviderName) -> Self {
        Self {
            name,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the next scripted outcome.
    pub fn push(&self, scripted: ScriptedSend) {
        self.script.lock().unwrap().push_back(scripted);
    }

    /// Convenience for a provider that always fails.
    pub fn failing(name: ProviderName, message: &str) -> Self {
        let p = Self::new(name);
        p.push(ScriptedSend::Fail(message.into()));
        p
    }

    /// All observed send calls, in order.
    pub fn calls(&self) -> Vec<(Uuid, Address, Vec<Target>, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsProvider for MockProvider {
    fn name(&self) -> ProviderName {
        self.name
    }

    async fn send_message(
        &self,
        message_id: Uuid,
        source: &Address,
        targets: &[Target],
        text: &str,
    ) -> Result<SendOutcome, CourierError> {
        self.calls.lock().unwrap().push((
            message_id,
            source.clone(),
            targets.to_vec(),
            text.to_string(),
        ));

        let scripted = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedSend::Accept {
                status: TargetStatus::Sent,
                parts: 1,
                reference_id: None,
            });

        match scripted {
            ScriptedSend::Accept {
                status,
                parts,
                reference_id,
            } => {
                let now = Utc::now();
                let targets = targets
                    .iter()
                    .map(|t| Target {
                        destination: t.destination.clone(),
                        status,
                        parts,
                        tm_update: now,
                    })
                    .collect();
                Ok(SendOutcome {
                    targets,
                    reference_id,
                })
            }
            ScriptedSend::Fail(message) => Err(CourierError::Provider {
                message,
                source: None,
            }),
        }
    }
}
