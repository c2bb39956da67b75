// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use courier_core::{Address, CourierError, Message, MessageFilter};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::server::GatewayState;

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Request body for POST /v1/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub customer_id: Uuid,
    /// Sending number, registered with the configured providers.
    pub source: Address,
    /// Ordered destination list; at least one entry.
    pub destinations: Vec<Address>,
    pub text: String,
}

/// Query parameters for GET /v1/messages.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Exclusive upper bound on creation time; defaults to now.
    #[serde(default)]
    pub page_token: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page_size: Option<u64>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub deleted: Option<bool>,
}

/// Response body for GET /v1/messages.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub messages: Vec<Message>,
    /// Token for the next page; absent when this page came back short.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<DateTime<Utc>>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /v1/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Json(body): Json<SendMessageRequest>,
) -> Response {
    match state
        .orchestrator
        .send(body.customer_id, body.source, body.destinations, body.text)
        .await
    {
        Ok(msg) => (StatusCode::OK, Json(msg)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /v1/messages
pub async fn list_messages(
    State(state): State<GatewayState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);

    let mut filters = Vec::new();
    if let Some(customer_id) = query.customer_id {
        filters.push(MessageFilter::CustomerId(customer_id));
    }
    if let Some(deleted) = query.deleted {
        filters.push(MessageFilter::Deleted(deleted));
    }

    match state
        .orchestrator
        .list(query.page_token, limit, &filters)
        .await
    {
        Ok(messages) => {
            let next_page_token = if messages.len() as u64 == limit {
                messages.last().map(|m| m.tm_create)
            } else {
                None
            };
            (
                StatusCode::OK,
                Json(ListResponse {
                    messages,
                    next_page_token,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /v1/messages/{id}
pub async fn get_message(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.orchestrator.get(id).await {
        Ok(msg) => (StatusCode::OK, Json(msg)).into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /v1/messages/{id}
pub async fn delete_message(
    State(state): State<GatewayState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.orchestrator.delete(id).await {
        Ok(msg) => (StatusCode::OK, Json(msg)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /hooks/{provider}
///
/// Provider callbacks post their raw body here; the path suffix selects the
/// parser. Ack-only callbacks return 204 with no body.
pub async fn post_hook(
    State(state): State<GatewayState>,
    Path(provider): Path<String>,
    body: Bytes,
) -> Response {
    match state.hooks.process(&provider, &body).await {
        Ok(Some(msg)) => (StatusCode::OK, Json(msg)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
        }),
    )
        .into_response()
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.prometheus_render {
        Some(render) => (StatusCode::OK, render()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "metrics not enabled".to_string(),
            }),
        )
            .into_response(),
    }
}

/// Map a pipeline error onto an HTTP status and JSON body.
fn error_response(err: CourierError) -> Response {
    let status = match &err {
        CourierError::Validation(_) | CourierError::Hook(_) => StatusCode::BAD_REQUEST,
        CourierError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
        CourierError::NotFound(_)
        | CourierError::NumberNotFound(_)
        | CourierError::UnknownProvider(_) => StatusCode::NOT_FOUND,
        CourierError::AmbiguousNumber { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(error = %err, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}
