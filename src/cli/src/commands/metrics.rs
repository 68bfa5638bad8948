//! Windowed metrics commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Deserialize;

use crate::client::ApiClient;
use crate::output::{self, MetricRow, OutputFormat};

#[derive(Subcommand)]
pub enum MetricsCommands {
    /// Event count in a time window
    Count(WindowArgs),

    /// Distinct active users in a time window
    UniqueUsers(WindowArgs),

    /// 95th percentile latency in a time window
    P95(WindowArgs),

    /// All three metrics at once
    Summary(WindowArgs),
}

#[derive(Args, Clone)]
pub struct WindowArgs {
    /// Window start, inclusive (UTC timestamp)
    #[arg(long)]
    from: String,

    /// Window end, exclusive (UTC timestamp)
    #[arg(long)]
    to: String,

    /// Restrict to one event type (ignored by unique-users)
    #[arg(long = "type")]
    event_type: Option<String>,
}

impl WindowArgs {
    fn params(&self, with_type: bool) -> Vec<(&'static str, String)> {
        let mut params = vec![("from", self.from.clone()), ("to", self.to.clone())];
        if with_type {
            if let Some(t) = &self.event_type {
                params.push(("type", t.clone()));
            }
        }
        params
    }
}

#[derive(Deserialize)]
struct CountResponse {
    count: i64,
}

#[derive(Deserialize)]
struct UniqueUsersResponse {
    unique_users: i64,
}

#[derive(Deserialize)]
struct P95Response {
    p95_latency_ms: i64,
}

pub async fn execute(cmd: MetricsCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        MetricsCommands::Count(args) => {
            let resp: CountResponse = client
                .get("/api/v1/metrics/count", &args.params(true))
                .await?;
            print_single("count", resp.count, format);
        }

        MetricsCommands::UniqueUsers(args) => {
            let resp: UniqueUsersResponse = client
                .get("/api/v1/metrics/unique_users", &args.params(false))
                .await?;
            print_single("unique_users", resp.unique_users, format);
        }

        MetricsCommands::P95(args) => {
            let resp: P95Response = client
                .get("/api/v1/metrics/p95", &args.params(true))
                .await?;
            print_single("p95_latency_ms", resp.p95_latency_ms, format);
        }

        MetricsCommands::Summary(args) => {
            let count: CountResponse = client
                .get("/api/v1/metrics/count", &args.params(true))
                .await?;
            let users: UniqueUsersResponse = client
                .get("/api/v1/metrics/unique_users", &args.params(false))
                .await?;
            let p95: P95Response = client
                .get("/api/v1/metrics/p95", &args.params(true))
                .await?;

            let rows = vec![
                MetricRow {
                    metric: "count",
                    value: count.count,
                },
                MetricRow {
                    metric: "unique_users",
                    value: users.unique_users,
                },
                MetricRow {
                    metric: "p95_latency_ms",
                    value: p95.p95_latency_ms,
                },
            ];

            match format {
                OutputFormat::Table => output::print_metric_table(&rows),
                _ => output::print_value(&rows, format),
            }
        }
    }

    Ok(())
}

fn print_single(name: &str, value: i64, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{}", value),
        _ => output::print_value(&serde_json::json!({ name: value }), format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(event_type: Option<&str>) -> WindowArgs {
        WindowArgs {
            from: "2025-06-01T00:00:00Z".to_string(),
            to: "2025-06-02T00:00:00Z".to_string(),
            event_type: event_type.map(String::from),
        }
    }

    #[test]
    fn test_params_include_type_when_requested() {
        let params = args(Some("login")).params(true);
        assert!(params.contains(&("type", "login".to_string())));
    }

    #[test]
    fn test_params_omit_type_for_unique_users() {
        let params = args(Some("login")).params(false);
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].0, "from");
        assert_eq!(params[1].0, "to");
    }

    #[test]
    fn test_params_pass_values_unescaped() {
        // Encoding is reqwest's job at request time; values stay raw here.
        let params = args(Some("page view+beta")).params(true);
        assert!(params.contains(&("type", "page view+beta".to_string())));
    }
}
