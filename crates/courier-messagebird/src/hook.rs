// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MessageBird webhook payload parsing.
//!
//! MessageBird posts the message object itself, discriminated by `direction`:
//! `"mo"` (mobile-originated) is an inbound SMS, `"mt"` is a status
//! acknowledgement for an outbound send. Recipient numbers arrive as either
//! JSON numbers or strings depending on the API version.

use courier_core::{Address, CourierError, InboundSms, Target};
use serde::Deserialize;
use tracing::warn;

/// Parses a raw MessageBird webhook body.
///
/// Returns `Ok(None)` for mobile-terminated acknowledgements, `Err` when the
/// body is not a recognizable MessageBird message object.
pub fn parse(raw: &[u8]) -> Result<Option<InboundSms>, CourierError> {
    let object: MessageObject = serde_json::from_slice(raw)
        .map_err(|e| CourierError::Hook(format!("malformed messagebird webhook: {e}")))?;

    match object.direction.as_str() {
        "mo" => {
            if object.recipients.items.is_empty() {
                return Err(CourierError::Hook(
                    "messagebird mo message has no recipients".into(),
                ));
            }
            let targets = object
                .recipients
                .items
                .iter()
                .map(|item| Target::received(Address::tel(item.recipient.as_string()), 1))
                .collect();
            Ok(Some(InboundSms {
                source: Address::tel(object.originator),
                targets,
                text: object.body,
            }))
        }
        "mt" => Ok(None),
        other => {
            warn!(direction = other, "ignoring messagebird message with unknown direction");
            Ok(None)
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    direction: String,
    #[serde(default)]
    originator: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    recipients: Recipients,
}

#[derive(Debug, Default, Deserialize)]
struct Recipients {
    #[serde(default)]
    items: Vec<RecipientItem>,
}

#[derive(Debug, Deserialize)]
struct RecipientItem {
    recipient: RecipientNumber,
}

/// MessageBird historically serialized recipients as bare integers; newer
/// payloads use strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipientNumber {
    Num(u64),
    Str(String),
}

impl RecipientNumber {
    fn as_string(&self) -> String {
        match self {
            Self::Num(n) => n.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::TargetStatus;

    #[test]
    fn mo_message_yields_inbound_sms() {
        let body = serde_json::json!({
            "id": "eef0ab57a9e049be946f3821568c2b2e",
            "direction": "mo",
            "originator": "+821100000002",
            "body": "reply from handset",
            "recipients": {
                "items": [{"recipient": "821100000001", "status": "delivered"}]
            }
        });

        let inbound = parse(body.to_string().as_bytes()).unwrap().unwrap();
        assert_eq!(inbound.source.number, "+821100000002");
        assert_eq!(inbound.targets.len(), 1);
        assert_eq!(inbound.targets[0].destination.number, "821100000001");
        assert_eq!(inbound.targets[0].status, TargetStatus::Received);
        assert_eq!(inbound.text, "reply from handset");
    }

    #[test]
    fn numeric_recipient_is_accepted() {
        let body = serde_json::json!({
            "direction": "mo",
            "originator": "+821100000002",
            "body": "hi",
            "recipients": {
                "items": [{"recipient": 821100000001u64, "status": "delivered"}]
            }
        });
        let inbound = parse(body.to_string().as_bytes()).unwrap().unwrap();
        assert_eq!(inbound.targets[0].destination.number, "821100000001");
    }

    #[test]
    fn mt_message_is_an_ack() {
        let body = serde_json::json!({
            "direction": "mt",
            "originator": "+821100000001",
            "body": "hi",
            "recipients": {"items": [{"recipient": "821100000002", "status": "sent"}]}
        });
        assert!(parse(body.to_string().as_bytes()).unwrap().is_none());
    }

    #[test]
    fn mo_without_recipients_is_rejected() {
        let body = serde_json::json!({
            "direction": "mo",
            "originator": "+821100000002",
            "body": "orphan",
            "recipients": {"items": []}
        });
        let err = parse(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, CourierError::Hook(_)));
    }

    #[test]
    fn malformed_body_is_a_hook_error() {
        let err = parse(b"{not json").unwrap_err();
        assert!(matches!(err, CourierError::Hook(_)));
    }
}
