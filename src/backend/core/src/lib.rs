//! Pulse: idempotent event ingestion and windowed aggregation over HTTP.
//!
//! The crate is organized around three seams:
//! - [`store`]: the persisted-state boundary ([`store::EventStore`]) with
//!   PostgreSQL and in-memory implementations
//! - [`ingest`] / [`aggregate`]: the write and read services on top of it
//! - [`api`]: the axum router, versioned under `/api/v1`

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod middleware;
pub mod observability;
pub mod store;

pub use aggregate::AggregationService;
pub use api::{build_router, AppState};
pub use config::Config;
pub use error::{ErrorCode, PulseError, Result};
pub use ingest::IngestService;
pub use store::{EventRecord, EventStore, InsertOutcome, MemoryEventStore, NewEvent, PgEventStore};
