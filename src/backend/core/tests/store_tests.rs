//! Store-level behavior tests against the in-memory backend.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use pulse_core::store::{EventStore, InsertOutcome, MemoryEventStore, NewEvent};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
}

fn event(
    event_id: Option<&str>,
    ts: DateTime<Utc>,
    user: &str,
    kind: &str,
    latency: i64,
) -> NewEvent {
    NewEvent {
        event_id: event_id.map(String::from),
        timestamp_utc: ts,
        user_id: user.to_string(),
        event_type: kind.to_string(),
        latency_ms: latency,
        metadata: json!({}),
    }
}

#[tokio::test]
async fn test_replay_preserves_original_payload() {
    let store = MemoryEventStore::new();

    let (original, _) = store
        .insert(event(Some("k1"), at(10, 0), "alice", "login", 100))
        .await
        .unwrap();

    // A conflicting payload under the same key must not overwrite anything.
    let (replayed, outcome) = store
        .insert(event(Some("k1"), at(23, 0), "mallory", "purchase", 9999))
        .await
        .unwrap();

    assert_eq!(outcome, InsertOutcome::AlreadyExists);
    assert_eq!(replayed, original);
    assert_eq!(
        store.count(at(0, 0), at(23, 59), None).await.unwrap(),
        1,
        "replay must not add rows"
    );
}

#[tokio::test]
async fn test_count_is_monotonic_under_inserts() {
    let store = MemoryEventStore::new();
    let window = (at(0, 0), at(23, 59));

    let mut last = 0;
    for i in 0..10 {
        store
            .insert(event(None, at(10, i), "user", "tick", 1))
            .await
            .unwrap();
        let count = store.count(window.0, window.1, None).await.unwrap();
        assert!(count >= last);
        last = count;
    }
    assert_eq!(last, 10);
}

#[tokio::test]
async fn test_adjacent_windows_partition_events() {
    let store = MemoryEventStore::new();
    for minute in [0, 15, 30, 45] {
        store
            .insert(event(None, at(10, minute), "u", "t", 1))
            .await
            .unwrap();
    }

    // [10:00, 10:30) and [10:30, 11:00) cover every event exactly once.
    let first = store.count(at(10, 0), at(10, 30), None).await.unwrap();
    let second = store.count(at(10, 30), at(11, 0), None).await.unwrap();
    let whole = store.count(at(10, 0), at(11, 0), None).await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 2);
    assert_eq!(first + second, whole);
}

#[tokio::test]
async fn test_unique_users_ignores_type_filter_semantics() {
    let store = MemoryEventStore::new();
    store
        .insert(event(None, at(10, 0), "alice", "login", 1))
        .await
        .unwrap();
    store
        .insert(event(None, at(10, 1), "alice", "purchase", 1))
        .await
        .unwrap();
    store
        .insert(event(None, at(10, 2), "bob", "login", 1))
        .await
        .unwrap();

    assert_eq!(store.unique_users(at(10, 0), at(11, 0)).await.unwrap(), 2);
}

#[tokio::test]
async fn test_concurrent_inserts_same_key_create_one_row() {
    let store = Arc::new(MemoryEventStore::new());

    let mut handles = Vec::new();
    for _ in 0..32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .insert(event(Some("race"), at(12, 0), "alice", "login", 10))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        let (_, outcome) = handle.await.unwrap().unwrap();
        if outcome == InsertOutcome::Created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(store.count(at(0, 0), at(23, 0), None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_latencies_returns_only_window_values() {
    let store = MemoryEventStore::new();
    store
        .insert(event(None, at(9, 0), "u", "t", 50))
        .await
        .unwrap();
    store
        .insert(event(None, at(10, 0), "u", "t", 100))
        .await
        .unwrap();
    store
        .insert(event(None, at(10, 30), "u", "other", 200))
        .await
        .unwrap();

    let mut all = store.latencies(at(10, 0), at(11, 0), None).await.unwrap();
    all.sort_unstable();
    assert_eq!(all, vec![100, 200]);

    let filtered = store
        .latencies(at(10, 0), at(11, 0), Some("t"))
        .await
        .unwrap();
    assert_eq!(filtered, vec![100]);
}
