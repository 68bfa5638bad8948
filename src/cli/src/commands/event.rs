//! Event ingestion commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::client::{ApiClient, PostOutcome};
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum EventCommands {
    /// Send a single event
    Send {
        /// User the event belongs to
        #[arg(long)]
        user_id: String,

        /// Event category (e.g. login, page_view, purchase)
        #[arg(long = "type")]
        event_type: String,

        /// Latency in milliseconds
        #[arg(long, default_value_t = 0)]
        latency_ms: i64,

        /// UTC timestamp of the event (defaults to now)
        #[arg(long)]
        timestamp: Option<String>,

        /// Idempotency key; resending the same key replays the original event
        #[arg(long, conflicts_with = "generate_id")]
        event_id: Option<String>,

        /// Generate a random idempotency key
        #[arg(long)]
        generate_id: bool,

        /// Metadata as a JSON object string
        #[arg(long, default_value = "{}")]
        metadata: String,
    },
}

pub async fn execute(cmd: EventCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        EventCommands::Send {
            user_id,
            event_type,
            latency_ms,
            timestamp,
            event_id,
            generate_id,
            metadata,
        } => {
            let event_id = if generate_id {
                Some(Uuid::new_v4().to_string())
            } else {
                event_id
            };

            let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

            let metadata: serde_json::Value =
                serde_json::from_str(&metadata).context("--metadata is not valid JSON")?;

            let payload = json!({
                "event_id": event_id,
                "timestamp_utc": timestamp,
                "user_id": user_id,
                "type": event_type,
                "latency_ms": latency_ms,
                "metadata_json": metadata,
            });

            let (stored, outcome): (serde_json::Value, _) =
                client.post("/api/v1/events", &payload).await?;

            match format {
                OutputFormat::Table => {
                    match outcome {
                        PostOutcome::Created => output::print_success("Event created"),
                        PostOutcome::Replayed => {
                            output::print_info("Event already existed; original returned")
                        }
                    }
                    if let Some(id) = stored.get("id") {
                        output::print_detail("id", &id.to_string());
                    }
                    if let Some(key) = stored.get("event_id").and_then(|v| v.as_str()) {
                        output::print_detail("event_id", key);
                    }
                }
                _ => output::print_value(&stored, format),
            }

            Ok(())
        }
    }
}
