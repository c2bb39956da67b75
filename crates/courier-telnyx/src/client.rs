// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Telnyx messaging API.
//!
//! Batch-shaped adapter: one `POST /v2/messages` call carries every
//! destination of a message, and the response's per-recipient receipt list is
//! mapped back onto the input targets by destination number. A transport or
//! HTTP-level error fails the entire call; no partial target information is
//! produced.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use courier_core::{
    Address, CourierError, MetricsSink, ProviderName, SendOutcome, SmsProvider, Target,
    TargetStatus,
};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Base URL for the Telnyx API.
const API_BASE_URL: &str = "https://api.telnyx.com";

const PROVIDER_SENT: &str = "courier_provider_sent_total";

/// Telnyx batch send adapter.
#[derive(Clone)]
pub struct TelnyxClient {
    client: reqwest::Client,
    base_url: String,
    messaging_profile_id: Option<String>,
    metrics: Arc<dyn MetricsSink>,
}

impl TelnyxClient {
    /// Creates a new Telnyx API client authenticated with `api_key`.
    pub fn new(
        api_key: &str,
        messaging_profile_id: Option<String>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, CourierError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| CourierError::Config(format!("invalid Telnyx API key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CourierError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            messaging_profile_id,
            metrics,
        })
    }

    /// Overrides the base URL (sandbox environments and wiremock tests).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[async_trait]
impl SmsProvider for TelnyxClient {
    fn name(&self) -> ProviderName {
        ProviderName::Telnyx
    }

    async fn send_message(
        &self,
        message_id: Uuid,
        source: &Address,
        targets: &[Target],
        text: &str,
    ) -> Result<SendOutcome, CourierError> {
        let request = SendRequest {
            from: source.number.clone(),
            to: targets.iter().map(|t| t.destination.number.clone()).collect(),
            text: text.to_string(),
            messaging_profile_id: self.messaging_profile_id.clone(),
        };

        let url = format!("{}/v2/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CourierError::Provider {
                message: format!("telnyx request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(%message_id, status = %status, "telnyx send response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::Provider {
                message: format!("telnyx returned {status}: {body}"),
                source: None,
            });
        }

        let body: SendResponse =
            response.json().await.map_err(|e| CourierError::Provider {
                message: format!("failed to parse telnyx response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let updated = apply_receipts(targets, &body.data);
        self.metrics.incr_counter(
            PROVIDER_SENT,
            &[("provider", "telnyx".into()), ("type", "sms".into())],
        );

        Ok(SendOutcome {
            targets: updated,
            reference_id: Some(body.data.id),
        })
    }
}

/// Map the response's per-recipient receipts back onto the input targets by
/// destination number. A target without a matching receipt keeps its state.
fn apply_receipts(targets: &[Target], data: &SendData) -> Vec<Target> {
    let now = Utc::now();
    targets
        .iter()
        .map(|target| {
            let receipt = data
                .to
                .iter()
                .find(|r| r.phone_number == target.destination.number);
            match receipt {
                Some(receipt) => Target {
                    destination: target.destination.clone(),
                    status: map_status(&receipt.status),
                    parts: data.parts,
                    tm_update: now,
                },
                None => {
                    warn!(
                        destination = %target.destination.number,
                        "telnyx receipt missing for destination, leaving target unchanged"
                    );
                    target.clone()
                }
            }
        })
        .collect()
}

fn map_status(raw: &str) -> TargetStatus {
    match raw {
        "queued" | "sending" | "sent" => TargetStatus::Sent,
        "delivered" => TargetStatus::Delivered,
        "sending_failed" | "delivery_failed" => TargetStatus::Failed,
        "gw_timeout" => TargetStatus::GwTimeout,
        "dlr_timeout" => TargetStatus::DlrTimeout,
        other => {
            warn!(status = other, "unrecognized telnyx status, treating as sent");
            TargetStatus::Sent
        }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest {
    from: String,
    to: Vec<String>,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    messaging_profile_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    data: SendData,
}

#[derive(Debug, Deserialize)]
struct SendData {
    id: String,
    #[serde(default)]
    parts: u32,
    to: Vec<Receipt>,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    phone_number: String,
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NoopSink;

    impl MetricsSink for NoopSink {
        fn incr_counter(&self, _name: &'static str, _labels: &[(&'static str, String)]) {}
    }

    fn test_client(base_url: &str) -> TelnyxClient {
        TelnyxClient::new("test-api-key", Some("profile-1".into()), Arc::new(NoopSink))
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn queued_targets(numbers: &[&str]) -> Vec<Target> {
        numbers
            .iter()
            .map(|n| Target::queued(Address::tel(*n)))
            .collect()
    }

    #[tokio::test]
    async fn batch_send_maps_receipts_by_destination() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "data": {
                "id": "6b79e50e426c4d64ac45345bae84fe55",
                "parts": 1,
                "to": [
                    {"phone_number": "+821100000002", "status": "queued"},
                    {"phone_number": "+821100000003", "status": "sending_failed"}
                ]
            }
        });

        Mock::given(method("POST"))
            .and(path("/v2/messages"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "from": "+821100000001",
                "to": ["+821100000002", "+821100000003"],
                "text": "hi",
                "messaging_profile_id": "profile-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let targets = queued_targets(&["+821100000002", "+821100000003"]);
        let outcome = client
            .send_message(Uuid::new_v4(), &Address::tel("+821100000001"), &targets, "hi")
            .await
            .unwrap();

        assert_eq!(
            outcome.reference_id.as_deref(),
            Some("6b79e50e426c4d64ac45345bae84fe55")
        );
        assert_eq!(outcome.targets.len(), 2);
        assert_eq!(outcome.targets[0].status, TargetStatus::Sent);
        assert_eq!(outcome.targets[0].parts, 1);
        assert_eq!(outcome.targets[1].status, TargetStatus::Failed);
    }

    #[tokio::test]
    async fn http_error_fails_the_whole_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/messages"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "errors": [{"code": "40305", "title": "Invalid phone number"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let targets = queued_targets(&["+821100000002"]);
        let err = client
            .send_message(Uuid::new_v4(), &Address::tel("+821100000001"), &targets, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Provider { .. }));
        assert!(err.to_string().contains("422"), "got: {err}");
    }

    #[tokio::test]
    async fn missing_receipt_leaves_target_queued() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "data": {
                "id": "ref-1",
                "parts": 1,
                "to": [{"phone_number": "+821100000002", "status": "queued"}]
            }
        });

        Mock::given(method("POST"))
            .and(path("/v2/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let targets = queued_targets(&["+821100000002", "+821100000009"]);
        let outcome = client
            .send_message(Uuid::new_v4(), &Address::tel("+821100000001"), &targets, "hi")
            .await
            .unwrap();

        assert_eq!(outcome.targets[0].status, TargetStatus::Sent);
        assert_eq!(outcome.targets[1].status, TargetStatus::Queued);
    }

    #[test]
    fn status_mapping_covers_terminal_states() {
        assert_eq!(map_status("queued"), TargetStatus::Sent);
        assert_eq!(map_status("delivered"), TargetStatus::Delivered);
        assert_eq!(map_status("delivery_failed"), TargetStatus::Failed);
        assert_eq!(map_status("gw_timeout"), TargetStatus::GwTimeout);
        assert_eq!(map_status("dlr_timeout"), TargetStatus::DlrTimeout);
    }
}
