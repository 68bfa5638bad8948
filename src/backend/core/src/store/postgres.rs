//! PostgreSQL-backed event store.
//!
//! Idempotency is enforced by the unique index on `events.event_id`, so
//! concurrent inserts of the same key are arbitrated by the database: one
//! transaction commits, every other one observes a unique violation and is
//! resolved by re-reading the committed row.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{ErrorCode, PulseError, Result};

use super::{EventRecord, EventStore, InsertOutcome, NewEvent};

/// Event store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Connect to the database and build the pool.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.url)
            .await
            .map_err(|e| {
                PulseError::with_internal(
                    ErrorCode::DatabaseConnectionFailed,
                    "Unable to connect to the database",
                    format!("connecting to PostgreSQL: {}", e),
                )
                .with_source(e)
            })?;

        info!(
            max_connections = config.max_connections,
            "database pool established"
        );

        Ok(Self { pool })
    }

    /// Run pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                PulseError::internal(format!("migration failed: {}", e))
            })?;
        info!("database migrations applied");
        Ok(())
    }

    /// Access the underlying pool (health checks).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_by_event_id(&self, event_id: &str) -> Result<EventRecord> {
        let row = sqlx::query(
            r#"
            SELECT id, event_id, timestamp_utc, user_id, "type", latency_ms, metadata
            FROM events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        record_from_row(&row)
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> Result<EventRecord> {
    Ok(EventRecord {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        timestamp_utc: row.try_get("timestamp_utc")?,
        user_id: row.try_get("user_id")?,
        event_type: row.try_get("type")?,
        latency_ms: row.try_get("latency_ms")?,
        metadata: row.try_get("metadata")?,
    })
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: NewEvent) -> Result<(EventRecord, InsertOutcome)> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO events (event_id, timestamp_utc, user_id, "type", latency_ms, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, event_id, timestamp_utc, user_id, "type", latency_ms, metadata
            "#,
        )
        .bind(&event.event_id)
        .bind(event.timestamp_utc)
        .bind(&event.user_id)
        .bind(&event.event_type)
        .bind(event.latency_ms)
        .bind(&event.metadata)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Ok((record_from_row(&row)?, InsertOutcome::Created)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                match event.event_id.as_deref() {
                    Some(key) => {
                        debug!(event_id = key, "duplicate insert resolved to existing row");
                        let existing = self.fetch_by_event_id(key).await?;
                        Ok((existing, InsertOutcome::AlreadyExists))
                    }
                    None => Err(PulseError::duplicate_without_key()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn count(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM events
            WHERE timestamp_utc >= $1
              AND timestamp_utc < $2
              AND ($3::text IS NULL OR "type" = $3)
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(event_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn unique_users(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT user_id)
            FROM events
            WHERE timestamp_utc >= $1
              AND timestamp_utc < $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn latencies(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_type: Option<&str>,
    ) -> Result<Vec<i64>> {
        let values: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT latency_ms
            FROM events
            WHERE timestamp_utc >= $1
              AND timestamp_utc < $2
              AND ($3::text IS NULL OR "type" = $3)
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(event_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }
}
