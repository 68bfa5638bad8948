//! CLI command implementations.

pub mod config;
pub mod event;
pub mod health;
pub mod metrics;
