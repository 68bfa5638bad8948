//! Aggregation service: windowed metrics over stored events.
//!
//! Every query takes a half-open UTC window `[from, to)`. Results are
//! computed against the store's state at query time; no caching, no
//! pre-aggregation.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::histogram;
use tracing::debug;

use crate::error::Result;
use crate::store::EventStore;

/// Read-side companion to the ingestion service.
#[derive(Clone)]
pub struct AggregationService {
    store: Arc<dyn EventStore>,
}

impl AggregationService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Number of events in the window, optionally restricted to one type.
    pub async fn count(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<i64> {
        self.timed("count", self.store.count(from, to, event_type))
            .await
    }

    /// Number of distinct users active in the window, across all types.
    pub async fn unique_users(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64> {
        self.timed("unique_users", self.store.unique_users(from, to))
            .await
    }

    /// 95th percentile of `latency_ms` in the window (nearest-rank).
    /// An empty window yields 0.
    pub async fn p95_latency(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<i64> {
        let mut values = self
            .timed("p95_latency", self.store.latencies(from, to, event_type))
            .await?;
        Ok(p95_nearest_rank(&mut values))
    }

    async fn timed<T>(
        &self,
        query: &'static str,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = fut.await;
        let elapsed = start.elapsed();
        histogram!("pulse_query_duration_seconds", "query" => query)
            .record(elapsed.as_secs_f64());
        debug!(query, elapsed_ms = elapsed.as_millis() as u64, "aggregation query");
        result
    }
}

/// Nearest-rank 95th percentile.
///
/// Sorts ascending and picks the value at rank `ceil(0.95 * n)` (1-based).
/// Always returns an actual observed value, never an interpolation; an empty
/// slice yields 0.
pub fn p95_nearest_rank(values: &mut [i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    values.sort_unstable();
    let rank = (0.95 * values.len() as f64).ceil() as usize;
    values[rank - 1]
}
