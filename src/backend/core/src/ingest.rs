//! Ingestion service: idempotent acceptance of validated events.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use crate::error::Result;
use crate::store::{EventRecord, EventStore, InsertOutcome, NewEvent};

/// Accepts validated events and persists them through the store, reporting
/// whether each submission created a new row or replayed an existing one.
#[derive(Clone)]
pub struct IngestService {
    store: Arc<dyn EventStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Persist `event`. Returns the stored record and `true` when the row is
    /// new, `false` when an event with the same `event_id` already existed.
    ///
    /// Replays are not errors: the original stored record is returned
    /// unchanged and the resubmitted payload is discarded.
    pub async fn ingest(&self, event: NewEvent) -> Result<(EventRecord, bool)> {
        let (record, outcome) = self.store.insert(event).await?;

        let is_new = outcome == InsertOutcome::Created;
        counter!(
            "pulse_events_ingested_total",
            "outcome" => if is_new { "created" } else { "replayed" },
        )
        .increment(1);

        debug!(
            id = record.id,
            event_id = ?record.event_id,
            event_type = %record.event_type,
            is_new,
            "event ingested"
        );

        Ok((record, is_new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEventStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample(event_id: Option<&str>) -> NewEvent {
        NewEvent {
            event_id: event_id.map(String::from),
            timestamp_utc: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            user_id: "alice".to_string(),
            event_type: "login".to_string(),
            latency_ms: 120,
            metadata: json!({"source": "test"}),
        }
    }

    #[tokio::test]
    async fn test_first_submission_is_new() {
        let service = IngestService::new(Arc::new(MemoryEventStore::new()));

        let (record, is_new) = service.ingest(sample(Some("evt-1"))).await.unwrap();
        assert!(is_new);
        assert_eq!(record.event_id.as_deref(), Some("evt-1"));
    }

    #[tokio::test]
    async fn test_resubmission_replays_without_error() {
        let service = IngestService::new(Arc::new(MemoryEventStore::new()));

        let (first, _) = service.ingest(sample(Some("evt-1"))).await.unwrap();
        let (second, is_new) = service.ingest(sample(Some("evt-1"))).await.unwrap();

        assert!(!is_new);
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_creates_exactly_once() {
        let service = IngestService::new(Arc::new(MemoryEventStore::new()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.ingest(sample(Some("evt-race"))).await
            }));
        }

        let mut created = 0;
        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            let (record, is_new) = handle.await.unwrap().unwrap();
            if is_new {
                created += 1;
            }
            ids.insert(record.id);
        }

        assert_eq!(created, 1);
        assert_eq!(ids.len(), 1);
    }
}
