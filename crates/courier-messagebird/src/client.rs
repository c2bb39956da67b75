// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the MessageBird REST API.
//!
//! Fan-out-shaped adapter: MessageBird's `POST /messages` accepts one
//! recipient list per call but reports a single aggregate status, so each
//! destination gets its own concurrent request and the per-call results are
//! fanned back in over a channel. The barrier is total: every spawned request
//! runs to completion before the call returns, and any individual failure
//! fails the whole call with no partial target information.

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
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Base URL for the MessageBird API.
const API_BASE_URL: &str = "https://rest.messagebird.com";

const PROVIDER_SENT: &str = "courier_provider_sent_total";

/// MessageBird per-destination fan-out adapter.
#[derive(Clone)]
pub struct MessageBirdClient {
    client: reqwest::Client,
    base_url: String,
    metrics: Arc<dyn MetricsSink>,
}

impl MessageBirdClient {
    /// Creates a new MessageBird API client authenticated with `access_key`.
    pub fn new(access_key: &str, metrics: Arc<dyn MetricsSink>) -> Result<Self, CourierError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("AccessKey {access_key}"))
            .map_err(|e| CourierError::Config(format!("invalid MessageBird access key: {e}")))?;
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
            metrics,
        })
    }

    /// Overrides the base URL (sandbox environments and wiremock tests).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn send_one(
        client: reqwest::Client,
        url: String,
        originator: String,
        destination: Address,
        body: String,
    ) -> Result<(Target, String), CourierError> {
        let request = SendRequest {
            originator,
            recipients: vec![destination.number.clone()],
            body,
        };

        let response = client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CourierError::Provider {
                message: format!("messagebird request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::Provider {
                message: format!("messagebird returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: SendResponse =
            response.json().await.map_err(|e| CourierError::Provider {
                message: format!("failed to parse messagebird response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let item_status = parsed
            .recipients
            .items
            .first()
            .map(|i| map_status(&i.status))
            .unwrap_or_else(|| {
                warn!(
                    destination = %destination.number,
                    "messagebird response carries no recipient item, treating as sent"
                );
                TargetStatus::Sent
            });

        let target = Target {
            destination,
            status: item_status,
            // MessageBird reports no segment count per recipient.
            parts: 1,
            tm_update: Utc::now(),
        };
        Ok((target, parsed.id))
    }
}

#[async_trait]
impl SmsProvider for MessageBirdClient {
    fn name(&self) -> ProviderName {
        ProviderName::Messagebird
    }

    async fn send_message(
        &self,
        message_id: Uuid,
        source: &Address,
        targets: &[Target],
        text: &str,
    ) -> Result<SendOutcome, CourierError> {
        let url = format!("{}/messages", self.base_url);
        let (tx, mut rx) = mpsc::channel(targets.len().max(1));

        for (idx, target) in targets.iter().enumerate() {
            let tx = tx.clone();
            let fut = Self::send_one(
                self.client.clone(),
                url.clone(),
                source.number.clone(),
                target.destination.clone(),
                text.to_string(),
            );
            tokio::spawn(async move {
                let result = fut.await;
                // The receiver outlives every sender; a send can only fail if
                // the whole call was dropped, in which case the result is moot.
                let _ = tx.send((idx, result)).await;
            });
        }
        drop(tx);

        // Channel closure is the barrier: every spawned request has reported.
        let mut updated: Vec<Option<Target>> = vec![None; targets.len()];
        let mut reference_id = None;
        let mut first_error = None;
        while let Some((idx, result)) = rx.recv().await {
            match result {
                Ok((target, id)) => {
                    if idx == 0 {
                        reference_id = Some(id);
                    }
                    updated[idx] = Some(target);
                }
                Err(e) => {
                    warn!(%message_id, index = idx, error = %e, "messagebird destination failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        // All-or-nothing: partial acceptance is reported as a provider
        // failure so the orchestrator can fall through to the next provider.
        if let Some(e) = first_error {
            return Err(e);
        }

        debug!(%message_id, count = targets.len(), "messagebird fan-out complete");
        self.metrics.incr_counter(
            PROVIDER_SENT,
            &[("provider", "messagebird".into()), ("type", "sms".into())],
        );

        let targets = updated
            .into_iter()
            .map(|t| {
                t.ok_or_else(|| CourierError::Internal("fan-out result slot left empty".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SendOutcome {
            targets,
            reference_id,
        })
    }
}

fn map_status(raw: &str) -> TargetStatus {
    match raw {
        "sent" | "buffered" | "scheduled" => TargetStatus::Sent,
        "delivered" => TargetStatus::Delivered,
        "delivery_failed" => TargetStatus::Failed,
        other => {
            warn!(status = other, "unrecognized messagebird status, treating as sent");
            TargetStatus::Sent
        }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest {
    originator: String,
    recipients: Vec<String>,
    body: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
    recipients: Recipients,
}

#[derive(Debug, Deserialize)]
struct Recipients {
    items: Vec<RecipientItem>,
}

#[derive(Debug, Deserialize)]
struct RecipientItem {
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

    fn test_client(base_url: &str) -> MessageBirdClient {
        MessageBirdClient::new("test-access-key", Arc::new(NoopSink))
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn queued_targets(numbers: &[&str]) -> Vec<Target> {
        numbers
            .iter()
            .map(|n| Target::queued(Address::tel(*n)))
            .collect()
    }

    fn accepted_body(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "recipients": {"items": [{"status": "sent"}]}
        })
    }

    #[tokio::test]
    async fn fan_out_sends_one_request_per_destination() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("authorization", "AccessKey test-access-key"))
            .and(body_partial_json(serde_json::json!({
                "originator": "+821100000001",
                "recipients": ["+821100000002"],
                "body": "hello"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(accepted_body("mb-ref-1")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(serde_json::json!({
                "recipients": ["+821100000003"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(accepted_body("mb-ref-2")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let targets = queued_targets(&["+821100000002", "+821100000003"]);
        let outcome = client
            .send_message(
                Uuid::new_v4(),
                &Address::tel("+821100000001"),
                &targets,
                "hello",
            )
            .await
            .unwrap();

        assert_eq!(outcome.reference_id.as_deref(), Some("mb-ref-1"));
        assert_eq!(outcome.targets.len(), 2);
        assert_eq!(outcome.targets[0].destination.number, "+821100000002");
        assert_eq!(outcome.targets[1].destination.number, "+821100000003");
        assert!(outcome.targets.iter().all(|t| t.status == TargetStatus::Sent));
        assert!(outcome.targets.iter().all(|t| t.parts == 1));
    }

    #[tokio::test]
    async fn one_failed_destination_fails_the_whole_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(serde_json::json!({
                "recipients": ["+821100000002"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(accepted_body("mb-ref-1")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_partial_json(serde_json::json!({
                "recipients": ["+821100000003"]
            })))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "errors": [{"code": 9, "description": "no (correct) recipients found"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let targets = queued_targets(&["+821100000002", "+821100000003"]);
        let err = client
            .send_message(
                Uuid::new_v4(),
                &Address::tel("+821100000001"),
                &targets,
                "hello",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Provider { .. }));
    }

    #[tokio::test]
    async fn delivery_failed_recipient_is_mapped_without_failing_the_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "mb-ref-1",
                "recipients": {"items": [{"status": "delivery_failed"}]}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let targets = queued_targets(&["+821100000002"]);
        let outcome = client
            .send_message(
                Uuid::new_v4(),
                &Address::tel("+821100000001"),
                &targets,
                "hello",
            )
            .await
            .unwrap();
        assert_eq!(outcome.targets[0].status, TargetStatus::Failed);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(map_status("sent"), TargetStatus::Sent);
        assert_eq!(map_status("buffered"), TargetStatus::Sent);
        assert_eq!(map_status("delivered"), TargetStatus::Delivered);
        assert_eq!(map_status("delivery_failed"), TargetStatus::Failed);
        assert_eq!(map_status("???"), TargetStatus::Sent);
    }
}
