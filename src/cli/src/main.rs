//! Pulse CLI - Command-line interface for the Pulse event service.
//!
//! Provides commands for event ingestion, windowed metrics, health checks,
//! and CLI configuration.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config, event, health, metrics};
use output::OutputFormat;

/// Pulse - Event Ingestion and Metrics CLI
#[derive(Parser)]
#[command(
    name = "pulse",
    version = "0.1.0",
    about = "Pulse - Event Ingestion and Metrics Service",
    long_about = "CLI tool for sending events to Pulse and querying windowed metrics.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(long, global = true, env = "PULSE_API_URL")]
    api_url: Option<String>,

    /// API key presented in the X-API-Key header
    #[arg(long, global = true, env = "PULSE_API_KEY")]
    api_key: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send events to the ingestion endpoint
    #[command(subcommand)]
    Event(event::EventCommands),

    /// Query windowed metrics
    #[command(subcommand)]
    Metrics(metrics::MetricsCommands),

    /// Check service health
    Health(health::HealthArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let api_url = cli
        .api_url
        .clone()
        .or_else(|| config::load_value("api-url"))
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| config::load_value("api-key"))
        .unwrap_or_else(|| "dev-key".to_string());

    let client = client::ApiClient::new(&api_url, &api_key)?;
    let format = cli.output;

    let result = match cli.command {
        Commands::Event(cmd) => event::execute(cmd, &client, format).await,
        Commands::Metrics(cmd) => metrics::execute(cmd, &client, format).await,
        Commands::Health(args) => health::execute(args, &client, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
