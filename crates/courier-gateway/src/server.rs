// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use courier_core::CourierError;
use courier_dispatch::{DeliveryOrchestrator, InboundHookProcessor};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<DeliveryOrchestrator>,
    pub hooks: Arc<InboundHookProcessor>,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Build the gateway router.
///
/// Routes:
/// - POST   /v1/messages        accept an outbound message
/// - GET    /v1/messages        paged listing
/// - GET    /v1/messages/{id}   fetch one message
/// - DELETE /v1/messages/{id}   soft-delete
/// - POST   /hooks/{provider}   provider webhook callbacks
/// - GET    /health, /metrics   unauthenticated operational endpoints
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/messages", post(handlers::post_message))
        .route("/v1/messages", get(handlers::list_messages))
        .route("/v1/messages/{id}", get(handlers::get_message))
        .route("/v1/messages/{id}", delete(handlers::delete_message))
        .route("/hooks/{provider}", post(handlers::post_hook))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server, shutting down gracefully when `shutdown`
/// is cancelled.
pub async fn start_server(
    host: &str,
    port: u16,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), CourierError> {
    let app = router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| CourierError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
