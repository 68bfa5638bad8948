//! Version 1 of the API.

pub mod events;
pub mod metrics;

use axum::{
    routing::{get, post},
    Router,
};

use super::AppState;

/// Routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(events::create_event))
        .route("/metrics/count", get(metrics::get_count))
        .route("/metrics/unique_users", get(metrics::get_unique_users))
        .route("/metrics/p95", get(metrics::get_p95))
}
