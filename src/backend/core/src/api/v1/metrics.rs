//! Windowed aggregation endpoints.
//!
//! All three endpoints take the same `from`/`to` query parameters describing
//! a half-open UTC window, plus an optional `type` filter where it applies.

use axum::{extract::Query, extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::{PulseError, Result};
use crate::store::parse_timestamp_utc;

/// Query parameters shared by the metrics endpoints.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

/// A validated half-open window.
#[derive(Debug)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl WindowQuery {
    /// Parse and validate the window. Unparseable instants are a validation
    /// failure (422); a parseable but inverted or empty range is 400.
    fn window(&self) -> Result<Window> {
        let from = parse_timestamp_utc(&self.from)
            .ok_or_else(|| PulseError::validation("'from' is not a valid timestamp"))?;
        let to = parse_timestamp_utc(&self.to)
            .ok_or_else(|| PulseError::validation("'to' is not a valid timestamp"))?;

        if from >= to {
            return Err(PulseError::invalid_window());
        }

        Ok(Window { from, to })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UniqueUsersResponse {
    pub unique_users: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct P95Response {
    pub p95_latency_ms: i64,
}

/// `GET /api/v1/metrics/count`
pub async fn get_count(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<CountResponse>> {
    let window = query.window()?;
    let count = state
        .aggregate
        .count(window.from, window.to, query.event_type.as_deref())
        .await?;
    Ok(Json(CountResponse { count }))
}

/// `GET /api/v1/metrics/unique_users`
pub async fn get_unique_users(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<UniqueUsersResponse>> {
    let window = query.window()?;
    let unique_users = state.aggregate.unique_users(window.from, window.to).await?;
    Ok(Json(UniqueUsersResponse { unique_users }))
}

/// `GET /api/v1/metrics/p95`
pub async fn get_p95(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<P95Response>> {
    let window = query.window()?;
    let p95_latency_ms = state
        .aggregate
        .p95_latency(window.from, window.to, query.event_type.as_deref())
        .await?;
    Ok(Json(P95Response { p95_latency_ms }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn query(from: &str, to: &str) -> WindowQuery {
        WindowQuery {
            from: from.to_string(),
            to: to.to_string(),
            event_type: None,
        }
    }

    #[test]
    fn test_valid_window_parses() {
        let window = query("2025-06-01T00:00:00Z", "2025-06-02T00:00:00Z")
            .window()
            .unwrap();
        assert!(window.from < window.to);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = query("2025-06-02T00:00:00Z", "2025-06-01T00:00:00Z")
            .window()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidWindow);
    }

    #[test]
    fn test_degenerate_window_rejected() {
        let err = query("2025-06-01T00:00:00Z", "2025-06-01T00:00:00Z")
            .window()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidWindow);
    }

    #[test]
    fn test_unparseable_instant_is_validation_error() {
        let err = query("garbage", "2025-06-01T00:00:00Z").window().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }
}
