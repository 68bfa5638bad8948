//! Terminal output for the Pulse CLI.
//!
//! Commands produce either human-oriented text (status lines, key-value
//! details, the metrics summary table) or a machine-readable serialization
//! of the server response, selected by `--output`.

use clap::ValueEnum;
use colored::*;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-oriented text and tables
    #[default]
    Table,
    /// Render as JSON
    Json,
    /// Render as YAML
    Yaml,
}

/// One metric in the summary table.
#[derive(Tabled, Serialize)]
pub struct MetricRow {
    pub metric: &'static str,
    pub value: i64,
}

/// Print a success message to stdout.
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), msg);
}

/// Print an informational message to stdout.
pub fn print_info(msg: &str) {
    println!("{} {}", "[INFO]".blue().bold(), msg);
}

/// Render the metrics summary as a rounded table.
pub fn print_metric_table(rows: &[MetricRow]) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Serialize a value as pretty JSON or YAML. Table format falls back to
/// JSON for responses that have no tabular rendering.
pub fn print_value<T: Serialize>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).expect("serialize to JSON");
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(value).expect("serialize to YAML");
            print!("{}", yaml);
        }
    }
}

/// Print a key-value detail line.
pub fn print_detail(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

/// Print a section header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", title.bold().underline());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_row_serializes_by_name() {
        let row = MetricRow {
            metric: "count",
            value: 42,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["metric"], "count");
        assert_eq!(json["value"], 42);
    }
}
