// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics sink for the Courier dispatch service.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Counters flow in
//! through the injected [`MetricsSink`] seam and are rendered as Prometheus
//! text format via [`PrometheusSink::render`], exposed on the gateway's
//! /metrics endpoint.

use courier_core::{CourierError, MetricsSink};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// [`MetricsSink`] backed by the process-wide Prometheus recorder.
pub struct PrometheusSink {
    handle: PrometheusHandle,
}

impl PrometheusSink {
    /// Installs the Prometheus recorder globally. Only one recorder can be
    /// installed per process; a second call returns an error.
    pub fn new() -> Result<Self, CourierError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            CourierError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl MetricsSink for PrometheusSink {
    fn incr_counter(&self, name: &'static str, labels: &[(&'static str, String)]) {
        let label_pairs: Vec<metrics::Label> = labels
            .iter()
            .map(|(k, v)| metrics::Label::new(*k, v.clone()))
            .collect();
        metrics::counter!(name, label_pairs).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The recorder can only be installed once per process, so install, count,
    // and render in a single test.
    #[test]
    fn counters_appear_in_rendered_output() {
        let sink = PrometheusSink::new().unwrap();
        sink.incr_counter(
            "courier_provider_sent_total",
            &[("provider", "telnyx".into()), ("type", "sms".into())],
        );
        sink.incr_counter(
            "courier_provider_sent_total",
            &[("provider", "telnyx".into()), ("type", "sms".into())],
        );

        let rendered = sink.render();
        assert!(rendered.contains("courier_provider_sent_total"));
        assert!(rendered.contains("provider=\"telnyx\""));
    }
}
