//! HTTP API surface.
//!
//! Layout:
//! - `/health` and `/metrics` are public
//! - `/api/v1/*` requires the API key and carries the versioned endpoints

pub mod handlers;
pub mod v1;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::aggregate::AggregationService;
use crate::config::AuthConfig;
use crate::ingest::IngestService;
use crate::middleware::ApiKeyLayer;
use crate::store::EventStore;

// ═══════════════════════════════════════════════════════════════════════════════
// Application State
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestService,
    pub aggregate: AggregationService,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            ingest: IngestService::new(store.clone()),
            aggregate: AggregationService::new(store),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Router
// ═══════════════════════════════════════════════════════════════════════════════

/// Build the full application router.
pub fn build_router(state: AppState, auth: &AuthConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        .nest("/api/v1", v1::routes())
        .layer(ApiKeyLayer::new(auth))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
