//! Event Store: durable, queryable persistence of events with a uniqueness
//! invariant on the client-supplied idempotency key.
//!
//! The [`EventStore`] trait is the persisted-state boundary of the system.
//! Any backend exposing `insert`, `count`, `unique_users`, and `latencies`
//! with the stated transactional and uniqueness guarantees is a valid
//! backing store; this crate ships a PostgreSQL implementation for
//! production ([`PgEventStore`]) and an in-process one for tests and local
//! development ([`MemoryEventStore`]).

mod memory;
mod postgres;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// Domain Types
// ═══════════════════════════════════════════════════════════════════════════════

/// A candidate event as accepted at the ingestion boundary, before it has
/// been assigned a surrogate id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    /// Client-provided unique ID for idempotency (optional).
    pub event_id: Option<String>,

    /// UTC instant the event occurred.
    pub timestamp_utc: DateTime<Utc>,

    /// Identifier of the acting user. Non-empty (enforced at the boundary).
    pub user_id: String,

    /// Event category (e.g. "login", "page_view", "purchase"). Non-empty,
    /// low-cardinality in practice.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Latency of the event in milliseconds. Non-negative.
    pub latency_ms: i64,

    /// Opaque metadata blob; stored and returned, never inspected.
    #[serde(rename = "metadata_json")]
    pub metadata: serde_json::Value,
}

/// A stored event, as returned to callers. Callers receive owned copies;
/// persisted rows are never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Store-assigned surrogate id. Insertion order, not timestamp order.
    pub id: i64,

    pub event_id: Option<String>,

    pub timestamp_utc: DateTime<Utc>,

    pub user_id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub latency_ms: i64,

    #[serde(rename = "metadata_json")]
    pub metadata: serde_json::Value,
}

/// Discriminator reported by [`EventStore::insert`], distinguishing a
/// genuinely new row from an idempotent replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was committed.
    Created,
    /// A row with the same `event_id` already existed; the returned record
    /// is the original insert and the candidate payload was discarded.
    AlreadyExists,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Store Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Persisted-state boundary of the system.
///
/// All time windows are half-open: `from` inclusive, `to` exclusive.
/// `insert` must either commit exactly one new row or leave the store
/// unchanged; concurrent inserts with the same `event_id` are arbitrated by
/// the backend's uniqueness guarantee, never by an in-process lock.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Attempt to persist `event`.
    ///
    /// Returns the stored row plus [`InsertOutcome::Created`]. When a row
    /// with the same non-null `event_id` already exists, returns the existing
    /// row plus [`InsertOutcome::AlreadyExists`]. A uniqueness violation on
    /// an event without an `event_id` is an invariant breach and fails with
    /// `ErrorCode::DuplicateWithoutIdempotencyKey`.
    async fn insert(&self, event: NewEvent) -> Result<(EventRecord, InsertOutcome)>;

    /// Number of events in `[from, to)`, optionally filtered by type.
    async fn count(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<i64>;

    /// Number of distinct `user_id` values in `[from, to)`. Ignores type.
    async fn unique_users(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64>;

    /// All `latency_ms` values of matching events, in no particular order.
    async fn latencies(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<Vec<i64>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Timestamp Normalization
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a client-supplied instant, normalizing to UTC.
///
/// Zoned timestamps (RFC 3339 with an offset) are converted to UTC; naive
/// timestamps are interpreted as already-UTC. Returns `None` when the string
/// matches neither form.
pub fn parse_timestamp_utc(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_zoned_timestamp_converts_to_utc() {
        let parsed = parse_timestamp_utc("2025-06-01T14:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_timestamp_assumed_utc() {
        let parsed = parse_timestamp_utc("2025-06-01T12:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_timestamp_with_fractional_seconds() {
        let parsed = parse_timestamp_utc("2025-06-01T12:30:00.250Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp_utc("not-a-timestamp").is_none());
        assert!(parse_timestamp_utc("2025-13-01T00:00:00").is_none());
        assert!(parse_timestamp_utc("").is_none());
    }
}
