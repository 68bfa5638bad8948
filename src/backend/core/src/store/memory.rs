//! In-process event store for tests and local development.
//!
//! Mirrors the PostgreSQL implementation's observable behavior, including
//! idempotent replay on `event_id`. A single mutex serializes inserts, which
//! stands in for the database's uniqueness arbitration.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::Result;

use super::{EventRecord, EventStore, InsertOutcome, NewEvent};

#[derive(Default)]
struct Inner {
    rows: Vec<EventRecord>,
    next_id: i64,
}

/// Event store holding all rows in memory.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: Mutex<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored rows, ignoring any window.
    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().rows.is_empty()
    }
}

fn in_window(row: &EventRecord, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    row.timestamp_utc >= from && row.timestamp_utc < to
}

fn matches_type(row: &EventRecord, event_type: Option<&str>) -> bool {
    event_type.map_or(true, |t| row.event_type == t)
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: NewEvent) -> Result<(EventRecord, InsertOutcome)> {
        let mut inner = self.inner.lock();

        if let Some(key) = event.event_id.as_deref() {
            if let Some(existing) = inner
                .rows
                .iter()
                .find(|row| row.event_id.as_deref() == Some(key))
            {
                return Ok((existing.clone(), InsertOutcome::AlreadyExists));
            }
        }

        inner.next_id += 1;
        let record = EventRecord {
            id: inner.next_id,
            event_id: event.event_id,
            timestamp_utc: event.timestamp_utc,
            user_id: event.user_id,
            event_type: event.event_type,
            latency_ms: event.latency_ms,
            metadata: event.metadata,
        };
        inner.rows.push(record.clone());

        Ok((record, InsertOutcome::Created))
    }

    async fn count(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<i64> {
        let inner = self.inner.lock();
        let count = inner
            .rows
            .iter()
            .filter(|row| in_window(row, from, to) && matches_type(row, event_type))
            .count();
        Ok(count as i64)
    }

    async fn unique_users(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64> {
        let inner = self.inner.lock();
        let users: HashSet<&str> = inner
            .rows
            .iter()
            .filter(|row| in_window(row, from, to))
            .map(|row| row.user_id.as_str())
            .collect();
        Ok(users.len() as i64)
    }

    async fn latencies(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<Vec<i64>> {
        let inner = self.inner.lock();
        let values = inner
            .rows
            .iter()
            .filter(|row| in_window(row, from, to) && matches_type(row, event_type))
            .map(|row| row.latency_ms)
            .collect();
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    fn event(id: Option<&str>, ts: DateTime<Utc>, user: &str, kind: &str, latency: i64) -> NewEvent {
        NewEvent {
            event_id: id.map(String::from),
            timestamp_utc: ts,
            user_id: user.to_string(),
            event_type: kind.to_string(),
            latency_ms: latency,
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn test_insert_then_replay_returns_original_row() {
        let store = MemoryEventStore::new();

        let (first, outcome) = store
            .insert(event(Some("evt-1"), at(10, 0), "alice", "login", 100))
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Created);

        // Same key, different payload. The replay wins nothing.
        let (second, outcome) = store
            .insert(event(Some("evt-1"), at(11, 0), "bob", "purchase", 999))
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::AlreadyExists);
        assert_eq!(second, first);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_keyless_inserts_are_always_distinct() {
        let store = MemoryEventStore::new();

        let (a, _) = store
            .insert(event(None, at(10, 0), "alice", "login", 100))
            .await
            .unwrap();
        let (b, _) = store
            .insert(event(None, at(10, 0), "alice", "login", 100))
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_window_is_half_open() {
        let store = MemoryEventStore::new();
        store
            .insert(event(None, at(10, 0), "alice", "login", 100))
            .await
            .unwrap();
        store
            .insert(event(None, at(11, 0), "bob", "login", 100))
            .await
            .unwrap();

        // Lower bound inclusive, upper bound exclusive.
        assert_eq!(store.count(at(10, 0), at(11, 0), None).await.unwrap(), 1);
        assert_eq!(store.count(at(10, 0), at(11, 1), None).await.unwrap(), 2);
        assert_eq!(store.count(at(10, 1), at(11, 0), None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_filters_by_type_but_unique_users_does_not() {
        let store = MemoryEventStore::new();
        store
            .insert(event(None, at(10, 0), "alice", "login", 100))
            .await
            .unwrap();
        store
            .insert(event(None, at(10, 5), "alice", "page_view", 50))
            .await
            .unwrap();
        store
            .insert(event(None, at(10, 10), "bob", "login", 200))
            .await
            .unwrap();

        assert_eq!(
            store.count(at(10, 0), at(11, 0), Some("login")).await.unwrap(),
            2
        );
        assert_eq!(store.count(at(10, 0), at(11, 0), None).await.unwrap(), 3);
        assert_eq!(store.unique_users(at(10, 0), at(11, 0)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_window_yields_no_rows() {
        let store = MemoryEventStore::new();
        store
            .insert(event(None, at(10, 0), "alice", "login", 100))
            .await
            .unwrap();

        assert_eq!(store.count(at(10, 0), at(10, 0), None).await.unwrap(), 0);
        assert!(store
            .latencies(at(10, 0), at(10, 0), None)
            .await
            .unwrap()
            .is_empty());
    }
}
