//! Logging and metrics bootstrap.
//!
//! Structured logging goes through `tracing`; metrics are recorded with the
//! `metrics` facade and exported in Prometheus text format via the public
//! `/metrics` endpoint.

use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::error::{PulseError, Result};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize tracing and the Prometheus metrics recorder.
///
/// Idempotent with respect to metrics: a second call reuses the already
/// installed recorder. `RUST_LOG` overrides the configured log level.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logging {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if PROMETHEUS_HANDLE.get().is_none() {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| PulseError::internal(format!("metrics recorder install failed: {}", e)))?;
        let _ = PROMETHEUS_HANDLE.set(handle);
        describe_metrics();
    }

    Ok(())
}

/// Render the current metrics snapshot in Prometheus text format.
pub fn render_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

fn describe_metrics() {
    describe_counter!(
        "pulse_events_ingested_total",
        "Events accepted at the ingestion endpoint, labeled by outcome (created/replayed)."
    );
    describe_counter!(
        "pulse_errors_total",
        "Errors raised anywhere in the service, labeled by code, category, and severity."
    );
    describe_counter!(
        "pulse_auth_errors_total",
        "Requests rejected by the API key middleware, labeled by error type."
    );
    describe_histogram!(
        "pulse_query_duration_seconds",
        "Duration of aggregation queries, labeled by query kind."
    );
}
