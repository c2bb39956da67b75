// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Wires storage, cache, metrics, the configured provider chain, the
//! dispatch pipeline, and the HTTP gateway, then runs until a shutdown
//! signal arrives and in-flight dispatches have drained.

use std::sync::Arc;

use courier_config::CourierConfig;
use courier_core::{CourierError, MetricsSink, SmsProvider};
use courier_dispatch::{
    BroadcastPublisher, DeliveryOrchestrator, InboundHookProcessor, StatusReconciler,
};
use courier_gateway::GatewayState;
use courier_messagebird::MessageBirdClient;
use courier_metrics::PrometheusSink;
use courier_storage::{Database, MemoryCache, MessageStore};
use courier_telnyx::TelnyxClient;
use tracing::{info, warn};

use crate::shutdown;
use crate::wiring::{ConfigBalance, StaticNumberRegistry};

/// Runs the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.server.log_level);

    info!("starting courier serve");

    let metrics: Arc<PrometheusSink> = Arc::new(PrometheusSink::new()?);
    let metrics_sink: Arc<dyn MetricsSink> = metrics.clone();

    let db = Database::open(&config.storage.path).await?;
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(MessageStore::new(db, cache, metrics_sink.clone()));

    let providers = build_providers(&config, metrics_sink.clone())?;
    if providers.is_empty() {
        warn!("no providers enabled; outbound messages will stay queued");
    }

    let publisher = Arc::new(BroadcastPublisher::default());
    let reconciler = Arc::new(StatusReconciler::new(store.clone(), publisher.clone()));
    let balance = Arc::new(ConfigBalance::new(config.balance.permissive));
    let registry = Arc::new(StaticNumberRegistry::from_config(&config.registry));

    let cancel = shutdown::install_signal_handler();

    let orchestrator = Arc::new(DeliveryOrchestrator::new(
        store.clone(),
        balance,
        providers,
        reconciler,
        publisher.clone(),
        metrics_sink,
        cancel.clone(),
    ));
    let hooks = Arc::new(InboundHookProcessor::new(store, registry, publisher));

    let render = metrics.clone();
    let state = GatewayState {
        orchestrator: orchestrator.clone(),
        hooks,
        prometheus_render: Some(Arc::new(move || render.render())),
        start_time: std::time::Instant::now(),
    };

    courier_gateway::start_server(&config.server.host, config.server.port, state, cancel).await?;

    info!("gateway stopped, draining in-flight dispatches");
    orchestrator.drain().await;
    info!("courier serve shut down cleanly");

    Ok(())
}

/// Build the provider fallback chain from configuration.
///
/// `providers.priority` gives the order; a named provider is skipped with a
/// warning when its section is disabled or missing credentials.
fn build_providers(
    config: &CourierConfig,
    metrics: Arc<dyn MetricsSink>,
) -> Result<Vec<Arc<dyn SmsProvider>>, CourierError> {
    let mut providers: Vec<Arc<dyn SmsProvider>> = Vec::new();

    for name in &config.providers.priority {
        match name.as_str() {
            "telnyx" => {
                if !config.telnyx.enabled {
                    warn!("telnyx listed in providers.priority but not enabled, skipping");
                    continue;
                }
                let mut client = TelnyxClient::new(
                    &config.telnyx.api_key,
                    config.telnyx.messaging_profile_id.clone(),
                    metrics.clone(),
                )?;
                if let Some(base_url) = &config.telnyx.base_url {
                    client = client.with_base_url(base_url.clone());
                }
                providers.push(Arc::new(client));
            }
            "messagebird" => {
                if !config.messagebird.enabled {
                    warn!("messagebird listed in providers.priority but not enabled, skipping");
                    continue;
                }
                let mut client =
                    MessageBirdClient::new(&config.messagebird.access_key, metrics.clone())?;
                if let Some(base_url) = &config.messagebird.base_url {
                    client = client.with_base_url(base_url.clone());
                }
                providers.push(Arc::new(client));
            }
            other => {
                return Err(CourierError::UnknownProvider(other.to_string()));
            }
        }
    }

    Ok(providers)
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
