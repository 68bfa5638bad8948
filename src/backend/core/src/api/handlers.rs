//! Public (unauthenticated) endpoint handlers.

use axum::{http::header, response::IntoResponse, Json};
use serde_json::json;

use crate::observability;

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "pulse",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Prometheus text-format metrics snapshot.
pub async fn prometheus_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        observability::render_metrics(),
    )
}
