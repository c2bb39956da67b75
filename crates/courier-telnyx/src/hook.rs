// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telnyx webhook payload parsing.
//!
//! Telnyx delivers every message event through one webhook envelope keyed by
//! `data.event_type`. Only `message.received` produces an inbound SMS; status
//! acknowledgements like `message.sent` and `message.finalized` are parsed and
//! discarded.

use courier_core::{Address, CourierError, InboundSms, Target};
use serde::Deserialize;
use tracing::warn;

/// Parses a raw Telnyx webhook body.
///
/// Returns `Ok(None)` for acknowledgement events that carry no inbound
/// message, `Err` when the body is not a recognizable Telnyx envelope.
pub fn parse(raw: &[u8]) -> Result<Option<InboundSms>, CourierError> {
    let envelope: Envelope = serde_json::from_slice(raw)
        .map_err(|e| CourierError::Hook(format!("malformed telnyx webhook: {e}")))?;

    match envelope.data.event_type.as_str() {
        "message.received" => {
            let payload = envelope.data.payload;
            if payload.to.is_empty() {
                return Err(CourierError::Hook(
                    "telnyx message.received has no recipients".into(),
                ));
            }
            let targets = payload
                .to
                .iter()
                .map(|r| Target::received(Address::tel(&r.phone_number), payload.parts))
                .collect();
            Ok(Some(InboundSms {
                source: Address::tel(payload.from.phone_number),
                targets,
                text: payload.text,
            }))
        }
        "message.sent" | "message.finalized" => Ok(None),
        other => {
            warn!(event_type = other, "ignoring unhandled telnyx event");
            Ok(None)
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    event_type: String,
    #[serde(default)]
    payload: Payload,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    from: Endpoint,
    #[serde(default)]
    to: Vec<Recipient>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    parts: u32,
}

#[derive(Debug, Default, Deserialize)]
struct Endpoint {
    #[serde(default)]
    phone_number: String,
}

#[derive(Debug, Deserialize)]
struct Recipient {
    phone_number: String,
}
